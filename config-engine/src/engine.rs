use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage backend behind the schema store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    Postgres,
    Mysql,
    #[default]
    Memory,
}

impl DatabaseEngine {
    pub const ALL: [DatabaseEngine; 3] = [
        DatabaseEngine::Postgres,
        DatabaseEngine::Mysql,
        DatabaseEngine::Memory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseEngine::Postgres => "postgres",
            DatabaseEngine::Mysql => "mysql",
            DatabaseEngine::Memory => "memory",
        }
    }
}

impl fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseEngine {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatabaseEngine::ALL
            .into_iter()
            .find(|engine| engine.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownEngine(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for engine in DatabaseEngine::ALL {
            assert_eq!(engine.to_string().parse::<DatabaseEngine>().unwrap(), engine);
        }
    }

    #[test]
    fn test_unknown_engine() {
        assert!(matches!(
            "Postgres".parse::<DatabaseEngine>(),
            Err(ConfigError::UnknownEngine(_))
        ));
        assert_eq!(DatabaseEngine::default(), DatabaseEngine::Memory);
    }
}
