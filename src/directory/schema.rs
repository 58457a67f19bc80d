use crate::error::Error;
use serde::Deserialize;
use serde_with::formats::PreferOne;
use serde_with::{serde_as, OneOrMany};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Attribute name to values. A single value may be written as a bare string in the schema
/// file.
pub type Attributes = BTreeMap<String, Vec<String>>;

/// The declarative description of the base directory tree.
///
/// ```json
/// {
///   "parents": { "ou=users": { "ou": "users", "objectClass": ["organizationalUnit", "top"] } },
///   "children": { "cn=admins,ou=groups": { "cn": "admins", "gidNumber": "4001" } }
/// }
/// ```
///
/// Every `parents` entry is created before any `children` entry.
#[serde_as]
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    #[serde_as(as = "BTreeMap<_, BTreeMap<_, OneOrMany<_, PreferOne>>>")]
    pub parents: BTreeMap<String, Attributes>,
    #[serde_as(as = "BTreeMap<_, BTreeMap<_, OneOrMany<_, PreferOne>>>")]
    pub children: BTreeMap<String, Attributes>,
}

impl Schema {
    /// Load a [`Schema`] from the JSON file at `p`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IO`] if the file can't be read and [`Error::InvalidJSON`] if it
    /// doesn't hold a `parents`/`children` description.
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::open(p)?;
        let reader = BufReader::new(f);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Entries in creation order: parents first, then children.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &Attributes)> {
        self.parents.iter().chain(self.children.iter())
    }
}
