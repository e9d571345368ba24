//! Weather station log kept in a MySQL database.

use anyhow::{anyhow, Context, Result};
use futures::TryStreamExt;
use log::{debug, warn};
use sqlx::{
    mysql::{MySqlConnectOptions, MySqlConnection},
    Connection,
};

use crate::table::MeteoWriter;

pub const DEFAULT_TABLE: &str = "wheatherlog";

/// Connection parameters for the weather database.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

pub async fn connect(credentials: &Credentials) -> Result<MySqlConnection> {
    let options = MySqlConnectOptions::new()
        .host(&credentials.host)
        .port(credentials.port)
        .username(&credentials.user)
        .password(&credentials.password)
        .database(&credentials.database);

    MySqlConnection::connect_with(&options).await.with_context(|| {
        format!(
            "cannot connect to {}@{}:{}/{}",
            credentials.user, credentials.host, credentials.port, credentials.database
        )
    })
}

/// Table names are interpolated into the query, so only plain identifiers
/// are accepted.
pub fn validate_table_name(table: &str) -> Result<&str> {
    let valid = !table.is_empty()
        && table.len() <= 64
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(table)
    } else {
        Err(anyhow!("invalid table name `{}`", table))
    }
}

/// Values are fetched as text so the CSV keeps what the database stores.
pub fn year_query(table: &str) -> Result<String> {
    let table = validate_table_name(table)?;

    Ok(format!(
        "SELECT DATE_FORMAT(ts, '%Y-%m-%d %H:%i:%s'), CAST(temp AS CHAR), CAST(hum AS CHAR) \
         FROM {} WHERE YEAR(ts) = ? ORDER BY ts",
        table
    ))
}

/// Streams the rows of `year` into `writer`, returns the number of rows written.
pub async fn export_year(
    conn: &mut MySqlConnection,
    table: &str,
    year: i32,
    writer: &mut MeteoWriter,
) -> Result<usize> {
    let sql = year_query(table)?;
    debug!("{}", sql);

    let mut rows = sqlx::query_as::<_, (Option<String>, Option<String>, Option<String>)>(&sql)
        .bind(year)
        .fetch(&mut *conn);

    let mut written = 0;
    let mut without_ts = 0;
    while let Some((ts, temp, hum)) = rows.try_next().await? {
        match ts {
            Some(ts) => {
                writer.write(&ts, temp.as_deref(), hum.as_deref())?;
                written += 1;
            }
            None => without_ts += 1,
        }
    }

    if without_ts > 0 {
        warn!("{}: skipped {} rows without timestamp", table, without_ts);
    }

    Ok(written)
}

// -- Tests -------------------------------------------------------------------
