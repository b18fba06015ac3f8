use bootmodel_source::prelude::ClassName;
use derive_more::Display;
use serde::Serialize;

///
/// Identifier
///
/// A schema identifier plus its quoting requirement.
///

#[derive(Clone, Debug, Display, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[display("{text}")]
pub struct Identifier {
    pub text: String,
    pub quoted: bool,
}

impl Identifier {
    #[must_use]
    pub fn new(text: impl Into<String>, quoted: bool) -> Self {
        Self {
            text: text.into(),
            quoted,
        }
    }

    /// Rendered form, double-quoted when quoting is required.
    #[must_use]
    pub fn render(&self) -> String {
        if self.quoted {
            format!("\"{}\"", self.text)
        } else {
            self.text.clone()
        }
    }
}

///
/// ColumnBinding
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ColumnBinding {
    pub name: Identifier,

    /// Source attribute name; `None` for synthetic columns such as the
    /// discriminator.
    pub attribute: Option<String>,

    pub nullable: bool,
    pub unique: bool,
    pub length: Option<i64>,
}

///
/// KeyReference
///
/// A foreign key from a table's primary key to its super-type's table, as
/// produced for joined-subclass topologies.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct KeyReference {
    pub target_table: Identifier,
    pub columns: Vec<Identifier>,
}

///
/// PhysicalTable
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PhysicalTable {
    pub logical_name: Identifier,
    pub physical_name: Identifier,
    pub catalog: Option<Identifier>,
    pub schema: Option<Identifier>,
    pub primary_key: Vec<Identifier>,
    pub columns: Vec<ColumnBinding>,
    pub key_reference: Option<KeyReference>,
}

///
/// SecondaryTable
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SecondaryTable {
    pub owner: ClassName,
    pub table: PhysicalTable,
}

///
/// InlineView
///
/// Backs a subselect mapping; never exportable.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct InlineView {
    pub logical_name: Identifier,
    pub subselect: String,
}

///
/// DenormalizedTable
///
/// Table-per-class topology: a physically distinct relation that duplicates
/// the primary key and column set of the table it denormalizes.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DenormalizedTable {
    pub table: PhysicalTable,

    /// Logical name of the denormalized base table.
    pub base: Identifier,
}

///
/// TableReference
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum TableReference {
    Physical(PhysicalTable),
    Secondary(SecondaryTable),
    InlineView(InlineView),
    Denormalized(DenormalizedTable),
}

impl TableReference {
    #[must_use]
    pub const fn logical_name(&self) -> &Identifier {
        match self {
            Self::Physical(t) => &t.logical_name,
            Self::Secondary(t) => &t.table.logical_name,
            Self::InlineView(t) => &t.logical_name,
            Self::Denormalized(t) => &t.table.logical_name,
        }
    }

    #[must_use]
    pub const fn physical_table(&self) -> Option<&PhysicalTable> {
        match self {
            Self::Physical(t) => Some(t),
            Self::Secondary(t) => Some(&t.table),
            Self::Denormalized(t) => Some(&t.table),
            Self::InlineView(_) => None,
        }
    }

    #[must_use]
    pub fn primary_key(&self) -> &[Identifier] {
        self.physical_table()
            .map_or(&[], |t| t.primary_key.as_slice())
    }

    #[must_use]
    pub const fn is_exportable(&self) -> bool {
        !matches!(self, Self::InlineView(_))
    }
}
