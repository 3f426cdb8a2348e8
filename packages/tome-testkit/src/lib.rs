mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

use tome_config::Postgres;
use tome_storage::db::Db;

pub const DSN_VAR: &str = "TOME_PG_DSN";

const MAINTENANCE_DATABASE: &str = "postgres";
const POOL_MAX_CONNS: u32 = 8;

/// A scratch notes database on the server named by `TOME_PG_DSN`.
///
/// The database is dropped by [`TestDatabase::cleanup`], or on drop when a test panics first.
pub struct TestDatabase {
	name: String,
	options: PgConnectOptions,
	dropped: bool,
}
impl TestDatabase {
	/// Creates a scratch database when `TOME_PG_DSN` is set.
	pub async fn from_env() -> Result<Option<Self>> {
		match env::var(DSN_VAR) {
			Ok(dsn) => Self::create(&dsn).await.map(Some),
			Err(_) => Ok(None),
		}
	}

	pub async fn create(server_dsn: &str) -> Result<Self> {
		let options = PgConnectOptions::from_str(server_dsn)
			.map_err(|err| Error::Message(format!("Failed to parse {DSN_VAR}: {err}.")))?;
		let name = format!("tome_test_{}", Uuid::new_v4().simple());
		let mut conn = maintenance_connection(&options).await?;

		sqlx::query(&format!(r#"CREATE DATABASE "{name}""#)).execute(&mut conn).await?;

		Ok(Self { options: options.database(&name), name, dropped: false })
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn dsn(&self) -> String {
		self.options.to_url_lossy().to_string()
	}

	/// Connects to the scratch database and creates the notes schema.
	pub async fn db(&self) -> Result<Db> {
		let cfg = Postgres { dsn: self.dsn(), pool_max_conns: POOL_MAX_CONNS };
		let db = Db::connect(&cfg).await?;

		db.ensure_schema().await?;

		Ok(db)
	}

	/// Drops the database. Open pools are disconnected by the server.
	pub async fn cleanup(mut self) -> Result<()> {
		drop_database(&self.options, &self.name).await?;

		self.dropped = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.dropped {
			return;
		}

		let options = self.options.clone();
		let name = self.name.clone();

		// Cleanup gets its own runtime.
		let dropper = thread::spawn(move || -> Result<()> {
			let runtime = Builder::new_current_thread().enable_all().build().map_err(Error::from)?;

			runtime.block_on(drop_database(&options, &name))
		});

		match dropper.join() {
			Ok(Ok(())) => {},
			Ok(Err(err)) => eprintln!("Failed to drop test database {}: {err}.", self.name),
			Err(_) => eprintln!("Test database drop thread panicked for {}.", self.name),
		}
	}
}

async fn maintenance_connection(options: &PgConnectOptions) -> Result<PgConnection> {
	PgConnection::connect_with(&options.clone().database(MAINTENANCE_DATABASE)).await.map_err(
		|err| Error::Message(format!("Failed to reach the {MAINTENANCE_DATABASE} database: {err}.")),
	)
}

async fn drop_database(options: &PgConnectOptions, name: &str) -> Result<()> {
	let mut conn = maintenance_connection(options).await?;

	sqlx::query(&format!(r#"DROP DATABASE IF EXISTS "{name}" WITH (FORCE)"#))
		.execute(&mut conn)
		.await?;

	Ok(())
}
