// src/schema.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Column descriptors, schema construction and table naming

use std::fmt;

use crate::error::{Error, Result};

/// Type of a single generated column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Integer drawn from the generator's closed range
    Integer,
    /// Quoted text of 1..=max(1, n) characters
    BoundedText(usize),
}

impl ColumnType {
    /// Map a type character (`i` or `v`) to a descriptor
    pub fn from_type_char(c: char, text_size: usize) -> Result<Self> {
        match c {
            'i' => Ok(ColumnType::Integer),
            'v' => Ok(ColumnType::BoundedText(text_size)),
            other => Err(Error::UnknownColumnType(other)),
        }
    }

    pub fn type_char(&self) -> char {
        match self {
            ColumnType::Integer => 'i',
            ColumnType::BoundedText(_) => 'v',
        }
    }

    /// Column type as written in `CREATE TABLE`
    pub fn sql_type(&self) -> String {
        match self {
            ColumnType::Integer => "int".to_string(),
            ColumnType::BoundedText(size) => format!("varchar({})", size),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ColumnType::BoundedText(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.column_type.sql_type())
    }
}

/// Ordered column list; order is output order in every generated row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Build a schema from explicit columns (at least one)
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::EmptySchema);
        }
        Ok(Self { columns })
    }

    /// Build a schema from column types, naming columns `c0`, `c1`, ... unless
    /// `names` is non-empty, in which case it must name every column with a
    /// non-blank name
    pub fn from_types(types: &[ColumnType], names: &[String]) -> Result<Self> {
        if types.is_empty() {
            return Err(Error::EmptySchema);
        }
        if !names.is_empty() && names.len() != types.len() {
            return Err(Error::ColumnNameMismatch {
                names: names.len(),
                columns: types.len(),
            });
        }

        let columns = types
            .iter()
            .enumerate()
            .map(|(i, ty)| {
                let name = match names.get(i).map(|name| name.trim()) {
                    Some("") => return Err(Error::EmptyColumnName { index: i }),
                    Some(name) => name.to_string(),
                    None => format!("c{}", i),
                };
                Ok(Column::new(name, *ty))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// True when any column is text, which makes `ENCLOSED BY` mandatory
    pub fn has_text(&self) -> bool {
        self.columns.iter().any(|c| c.column_type.is_text())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Type characters in column order, e.g. `"viivi"`
    pub fn type_string(&self) -> String {
        self.columns.iter().map(|c| c.column_type.type_char()).collect()
    }
}

/// Column types as given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    /// `int`: every column is an integer
    Int,
    /// `varchar`: every column is bounded text
    Varchar,
    /// A string of `i`/`v` characters, one per column
    Custom(Vec<ColumnType>),
}

impl TypeSpec {
    /// Parse `int`, `varchar`, or a per-column string such as `"iv i"`.
    /// Whitespace in per-column strings is ignored.
    pub fn parse(spec: &str, text_size: usize) -> Result<Self> {
        match spec.trim() {
            "int" => Ok(TypeSpec::Int),
            "varchar" => Ok(TypeSpec::Varchar),
            custom => {
                let types = custom
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .map(|c| ColumnType::from_type_char(c, text_size))
                    .collect::<Result<Vec<_>>>()?;
                if types.is_empty() {
                    return Err(Error::EmptySchema);
                }
                Ok(TypeSpec::Custom(types))
            }
        }
    }

    /// Expand into one descriptor per column. Per-column strings carry their
    /// own column count; `column_count` applies to the uniform forms only.
    pub fn column_types(&self, column_count: usize, text_size: usize) -> Vec<ColumnType> {
        match self {
            TypeSpec::Int => vec![ColumnType::Integer; column_count],
            TypeSpec::Varchar => vec![ColumnType::BoundedText(text_size); column_count],
            TypeSpec::Custom(types) => types.clone(),
        }
    }

    /// Build the schema for this spec
    pub fn schema(&self, column_count: usize, text_size: usize, names: &[String]) -> Result<Schema> {
        if let TypeSpec::Custom(types) = self {
            if column_count != types.len() {
                tracing::debug!(
                    "Per-column type string defines {} columns, ignoring column count {}",
                    types.len(),
                    column_count
                );
            }
        }
        Schema::from_types(&self.column_types(column_count, text_size), names)
    }

    /// Name a table `{prefix}{cols}{suffix}`, e.g. `T10i` or `T1Kv32`.
    /// Per-column strings cannot be named this way.
    pub fn infer_table_name(
        &self,
        prefix: &str,
        column_count: usize,
        text_size: usize,
    ) -> Result<String> {
        let suffix = match self {
            TypeSpec::Int => "i".to_string(),
            TypeSpec::Varchar => format!("v{}", abbreviate(text_size as u64)),
            TypeSpec::Custom(_) => return Err(Error::TableNameRequired),
        };
        Ok(format!(
            "{}{}{}",
            prefix,
            abbreviate(column_count as u64),
            suffix
        ))
    }
}

/// Abbreviate a count for table names: 1_000 -> 1K, 2_500_000 -> 2M
pub fn abbreviate(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{}M", n / 1_000_000)
    } else if n >= 1_000 {
        format!("{}K", n / 1_000)
    } else {
        n.to_string()
    }
}
