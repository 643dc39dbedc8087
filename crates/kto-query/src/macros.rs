use std::collections::BTreeMap;

/// Named query fragments, referenced as `$name`.
#[derive(Clone, Debug)]
pub struct MacroTable {
    macros: BTreeMap<String, String>,
}

impl Default for MacroTable {
    fn default() -> Self {
        let mut macros = BTreeMap::new();
        macros.insert("main".to_string(), "!type~price|rate order:desc".to_string());
        macros.insert("prices".to_string(), "type~price|rate order:desc".to_string());
        macros.insert("income".to_string(), "type~dividend|interest".to_string());
        MacroTable { macros }
    }
}

impl MacroTable {
    /// Table without the built-in macros.
    pub fn empty() -> Self {
        MacroTable {
            macros: BTreeMap::new(),
        }
    }

    /// Add or replace a macro. A leading `$` on `name` is ignored.
    pub fn insert(&mut self, name: &str, body: impl Into<String>) {
        let name = name.strip_prefix('$').unwrap_or(name);
        self.macros.insert(name.to_ascii_lowercase(), body.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.macros.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.macros.keys().map(String::as_str)
    }
}

impl<K: AsRef<str>, V: Into<String>> Extend<(K, V)> for MacroTable {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k.as_ref(), v);
        }
    }
}
