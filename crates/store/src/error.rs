use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The link row exists but its local team is not enabled for bridging.
    #[error("link not enabled for team {team_id}")]
    TeamNotEnabled { team_id: String },

    /// The host directory has no team with this id.
    #[error("unknown team: {team_id}")]
    UnknownTeam { team_id: String },

    /// A stored token blob could not be parsed.
    #[error("stored token is malformed: {source}")]
    TokenDecode {
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported database url scheme: {scheme}")]
    UnsupportedDatabase { scheme: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn team_not_enabled(team_id: impl Into<String>) -> Self {
        Self::TeamNotEnabled {
            team_id: team_id.into(),
        }
    }

    #[must_use]
    pub fn unknown_team(team_id: impl Into<String>) -> Self {
        Self::UnknownTeam {
            team_id: team_id.into(),
        }
    }

    #[must_use]
    pub fn unsupported_database(scheme: impl Into<String>) -> Self {
        Self::UnsupportedDatabase {
            scheme: scheme.into(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// True when the backend rejected an insert because the primary key is taken.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Sqlx(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_team_not_enabled(&self) -> bool {
        matches!(self, Self::TeamNotEnabled { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
