//! SQLite database handle for the Scribe server.

scribe_core::define_database!(ScribeDatabase, "Scribe database migrations complete");
