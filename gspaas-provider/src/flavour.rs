//! Flavour - The closed set of service kinds a template can implement

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flavour {
    Kubernetes,
    MariaDb,
    MySql,
    Postgres,
    MsSql,
    Memcached,
    RedisStore,
    Filesystem,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown flavour '{0}'")]
pub struct UnknownFlavour(pub String);

impl Flavour {
    pub const ALL: [Flavour; 8] = [
        Flavour::Kubernetes,
        Flavour::MariaDb,
        Flavour::MySql,
        Flavour::Postgres,
        Flavour::MsSql,
        Flavour::Memcached,
        Flavour::RedisStore,
        Flavour::Filesystem,
    ];

    /// Tag used by the template catalog
    pub fn as_str(&self) -> &'static str {
        match self {
            Flavour::Kubernetes => "kubernetes",
            Flavour::MariaDb => "mariadb",
            Flavour::MySql => "mysql",
            Flavour::Postgres => "postgres",
            Flavour::MsSql => "mssql",
            Flavour::Memcached => "memcached",
            Flavour::RedisStore => "redis-store",
            Flavour::Filesystem => "filesystem",
        }
    }

    /// Product name used in user-facing messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Flavour::Kubernetes => "Kubernetes",
            Flavour::MariaDb => "MariaDB",
            Flavour::MySql => "MySQL",
            Flavour::Postgres => "PostgreSQL",
            Flavour::MsSql => "MS SQL Server",
            Flavour::Memcached => "Memcached",
            Flavour::RedisStore => "Redis store",
            Flavour::Filesystem => "Filesystem",
        }
    }
}

impl FromStr for Flavour {
    type Err = UnknownFlavour;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Flavour::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownFlavour(s.to_string()))
    }
}

impl fmt::Display for Flavour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_catalog_tags() {
        for flavour in Flavour::ALL {
            assert_eq!(flavour.as_str().parse::<Flavour>(), Ok(flavour));
        }
        assert_eq!("redis-store".parse::<Flavour>(), Ok(Flavour::RedisStore));
        assert_eq!(
            "redis-cache".parse::<Flavour>(),
            Err(UnknownFlavour("redis-cache".to_string()))
        );
    }
}
