use async_trait::async_trait;
use dbpeek_core::connection::{BackendError, ConnectionDescriptor, DatabaseBackend};
use dbpeek_core::result_table::ResultSet;
use dbpeek_core::sql_generator::{BoundQuery, LIST_TABLES_SQL};
use mysql_async::consts::ColumnType;
use mysql_async::prelude::Queryable;
use mysql_async::{Column, Conn, Opts, OptsBuilder, Params, Row, Value};

use crate::dsn::{Address, Dsn};

#[derive(Debug, Clone, Default)]
pub struct MysqlBackend;

#[async_trait]
impl DatabaseBackend for MysqlBackend {
    type Connection = Conn;

    async fn connect(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Self::Connection, BackendError> {
        let opts = opts_from_descriptor(descriptor.as_str())?;
        Conn::new(opts).await.map_err(to_backend_error)
    }

    async fn disconnect(&self, connection: Self::Connection) -> Result<(), BackendError> {
        connection.disconnect().await.map_err(to_backend_error)
    }

    async fn list_tables(
        &self,
        connection: &mut Self::Connection,
    ) -> Result<Vec<String>, BackendError> {
        connection
            .query_map(LIST_TABLES_SQL, |name: String| name)
            .await
            .map_err(to_backend_error)
    }

    async fn fetch(
        &self,
        connection: &mut Self::Connection,
        query: &BoundQuery,
    ) -> Result<ResultSet, BackendError> {
        let params = if query.params().is_empty() {
            Params::Empty
        } else {
            Params::Positional(query.params().iter().copied().map(Value::UInt).collect())
        };

        let result = connection
            .exec_iter(query.sql(), params)
            .await
            .map_err(to_backend_error)?;
        let columns = result
            .columns_ref()
            .iter()
            .map(|column| column.name_str().into_owned())
            .collect::<Vec<_>>();
        let formats = result
            .columns_ref()
            .iter()
            .map(ColumnFormat::from)
            .collect::<Vec<_>>();
        let rows = result
            .collect_and_drop::<Row>()
            .await
            .map_err(to_backend_error)?
            .into_iter()
            .map(|row| {
                row.unwrap()
                    .into_iter()
                    .zip(&formats)
                    .map(|(value, format)| value_to_bytes(value, *format))
                    .collect()
            })
            .collect();

        Ok(ResultSet { columns, rows })
    }
}

/// Accepts either a `mysql://` URL or the classic `user:pass@tcp(host)/db` form.
pub fn opts_from_descriptor(raw: &str) -> Result<Opts, BackendError> {
    let raw = raw.trim();
    if raw.starts_with("mysql://") {
        return Opts::from_url(raw).map_err(|error| BackendError::new(error.to_string()));
    }

    let dsn = Dsn::parse(raw).map_err(|error| BackendError::new(error.to_string()))?;
    if !dsn.params.is_empty() {
        log::debug!(
            "ignoring connection parameters: {}",
            dsn.params
                .iter()
                .map(|(key, _)| key.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let builder = OptsBuilder::default()
        .user(dsn.user)
        .pass(dsn.password)
        .db_name(dsn.database);
    let builder = match dsn.address {
        Address::Tcp { host, port } => builder
            .ip_or_hostname(host)
            .tcp_port(port)
            .prefer_socket(false),
        Address::Socket(path) => builder.socket(Some(path)),
    };

    Ok(Opts::from(builder))
}

/// What the binary protocol drops and the text protocol keeps: whether a
/// temporal value is a plain DATE, and how many fractional digits to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnFormat {
    column_type: ColumnType,
    decimals: u8,
}

impl From<&Column> for ColumnFormat {
    fn from(column: &Column) -> Self {
        Self {
            column_type: column.column_type(),
            decimals: column.decimals(),
        }
    }
}

impl ColumnFormat {
    fn is_date_only(self) -> bool {
        matches!(
            self.column_type,
            ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE
        )
    }
}

fn value_to_bytes(value: Value, format: ColumnFormat) -> Option<Vec<u8>> {
    match value {
        Value::NULL => None,
        Value::Bytes(bytes) => Some(bytes),
        other => Some(value_to_text(&other, format).into_bytes()),
    }
}

fn value_to_text(value: &Value, format: ColumnFormat) -> String {
    match *value {
        Value::NULL => String::new(),
        Value::Bytes(ref bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::Int(value) => value.to_string(),
        Value::UInt(value) => value.to_string(),
        Value::Float(value) => value.to_string(),
        Value::Double(value) => value.to_string(),
        Value::Date(year, month, day, ..) if format.is_date_only() => {
            format!("{year:04}-{month:02}-{day:02}")
        }
        Value::Date(year, month, day, hour, minute, second, micros) => format!(
            "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}{}",
            fraction(micros, format.decimals)
        ),
        Value::Time(is_negative, days, hours, minutes, seconds, micros) => {
            let sign = if is_negative { "-" } else { "" };
            let hours = u64::from(days) * 24 + u64::from(hours);
            format!(
                "{sign}{hours:02}:{minutes:02}:{seconds:02}{}",
                fraction(micros, format.decimals)
            )
        }
    }
}

// Temporal columns declare 0..=6 fractional digits; anything else means unknown.
fn fraction(micros: u32, decimals: u8) -> String {
    let digits = usize::from(decimals);
    if (1..=6).contains(&digits) {
        let padded = format!("{micros:06}");
        format!(".{}", &padded[..digits])
    } else if micros > 0 {
        format!(".{micros:06}")
    } else {
        String::new()
    }
}

fn to_backend_error(error: mysql_async::Error) -> BackendError {
    BackendError::new(error.to_string())
}
