use std::fmt;

/// Fatal substrate failure.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum QueryError {
    /// A query transitively depends on itself. `path` lists the active
    /// queries from the outermost to the one that re-entered.
    Cycle {
        query: &'static str,
        key: String,
        path: Vec<&'static str>,
    },
    /// A dependency names a storage the database does not have.
    UnknownIngredient { index: u32 },
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Cycle { query, key, path } => {
                write!(f, "query cycle on {query}({key})")?;
                if !path.is_empty() {
                    write!(f, " via {}", path.join(" -> "))?;
                }
                Ok(())
            }
            QueryError::UnknownIngredient { index } => {
                write!(f, "dependency on unknown ingredient {index}")
            }
        }
    }
}

impl std::error::Error for QueryError {}
