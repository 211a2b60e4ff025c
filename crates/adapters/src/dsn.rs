//! Reader for the classic MySQL DSN form
//! `[user[:password]@][protocol[(address)]]/dbname[?param=value&...]`.

use thiserror::Error;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_SOCKET: &str = "/tmp/mysql.sock";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DsnError {
    #[error("connection string is missing the `/dbname` part")]
    MissingDatabaseSeparator,
    #[error("unsupported protocol `{0}`; use tcp or unix")]
    UnsupportedProtocol(String),
    #[error("address in `{0}` is missing its closing parenthesis")]
    UnclosedAddress(String),
    #[error("invalid port `{0}`")]
    InvalidPort(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Tcp { host: String, port: u16 },
    Socket(String),
}

impl Default for Address {
    fn default() -> Self {
        Self::Tcp {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dsn {
    pub user: Option<String>,
    pub password: Option<String>,
    pub address: Address,
    pub database: Option<String>,
    pub params: Vec<(String, String)>,
}

impl Dsn {
    pub fn parse(raw: &str) -> Result<Self, DsnError> {
        let raw = raw.trim();
        let slash = raw.rfind('/').ok_or(DsnError::MissingDatabaseSeparator)?;
        // A socket path contains slashes too; the database separator is the
        // last one outside the parentheses.
        let slash = match (raw.rfind('('), raw.rfind(')')) {
            (Some(_), Some(close)) if slash < close => raw[close..]
                .find('/')
                .map(|offset| close + offset)
                .ok_or(DsnError::MissingDatabaseSeparator)?,
            _ => slash,
        };
        let (prefix, suffix) = (&raw[..slash], &raw[slash + 1..]);

        let (credentials, location) = match prefix.rfind('@') {
            Some(at) => (Some(&prefix[..at]), &prefix[at + 1..]),
            None => (None, prefix),
        };

        let (user, password) = match credentials {
            Some(credentials) => match credentials.split_once(':') {
                Some((user, password)) => (non_empty(user), Some(password.to_string())),
                None => (non_empty(credentials), None),
            },
            None => (None, None),
        };

        let (database, params) = match suffix.split_once('?') {
            Some((database, query)) => (non_empty(database), parse_params(query)),
            None => (non_empty(suffix), Vec::new()),
        };

        Ok(Self {
            user,
            password,
            address: parse_location(location)?,
            database,
            params,
        })
    }
}

fn parse_location(location: &str) -> Result<Address, DsnError> {
    let (protocol, address) = match location.find('(') {
        Some(open) => {
            let address = location[open + 1..]
                .strip_suffix(')')
                .ok_or_else(|| DsnError::UnclosedAddress(location.to_string()))?;
            (&location[..open], non_empty(address))
        }
        None => (location, None),
    };

    match protocol {
        "" | "tcp" => match address {
            Some(address) => split_host_port(&address),
            None => Ok(Address::default()),
        },
        "unix" => Ok(Address::Socket(
            address.unwrap_or_else(|| DEFAULT_SOCKET.to_string()),
        )),
        other => Err(DsnError::UnsupportedProtocol(other.to_string())),
    }
}

fn split_host_port(address: &str) -> Result<Address, DsnError> {
    let (host, port) = if let Some(bracketed) = address.strip_prefix('[') {
        let (host, tail) = bracketed
            .split_once(']')
            .ok_or_else(|| DsnError::UnclosedAddress(address.to_string()))?;
        (host, tail.strip_prefix(':'))
    } else {
        match address.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (address, None),
        }
    };

    let port = match port {
        Some(port) => port
            .parse::<u16>()
            .map_err(|_| DsnError::InvalidPort(port.to_string()))?,
        None => DEFAULT_PORT,
    };

    Ok(Address::Tcp {
        host: non_empty(host).unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port,
    })
}

fn parse_params(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
