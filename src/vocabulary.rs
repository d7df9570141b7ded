//! Literal/symbolic token name lookups, used only for diagnostics — they
//! have no bearing on matching.

use hashbrown::HashMap;

use crate::token::TOKEN_EOF;

pub trait Vocabulary {
    fn literal_name(&self, token_type: i32) -> Option<&str>;
    fn symbolic_name(&self, token_type: i32) -> Option<&str>;

    fn display_name(&self, token_type: i32) -> String {
        if token_type == TOKEN_EOF {
            return "EOF".to_string();
        }
        if let Some(n) = self.literal_name(token_type) {
            return n.to_string();
        }
        if let Some(n) = self.symbolic_name(token_type) {
            return n.to_string();
        }
        token_type.to_string()
    }
}

#[derive(Debug, Default, Clone)]
pub struct VocabularyImpl {
    literal_names: Vec<Option<String>>,
    symbolic_names: Vec<Option<String>>,
}

impl VocabularyImpl {
    pub fn new(literal_names: Vec<Option<String>>, symbolic_names: Vec<Option<String>>) -> Self {
        Self { literal_names, symbolic_names }
    }

    /// Builds the `name -> token type` map a generated recognizer's
    /// `get_token_type` convenience needs.
    pub fn token_type_map(&self) -> HashMap<String, i32> {
        let mut map = HashMap::new();
        for (i, name) in self.symbolic_names.iter().enumerate() {
            if let Some(n) = name {
                map.insert(n.clone(), i as i32);
            }
        }
        for (i, name) in self.literal_names.iter().enumerate() {
            if let Some(n) = name {
                map.entry(n.clone()).or_insert(i as i32);
            }
        }
        map.insert("EOF".to_string(), TOKEN_EOF);
        map
    }
}

impl Vocabulary for VocabularyImpl {
    fn literal_name(&self, token_type: i32) -> Option<&str> {
        self.literal_names.get(token_type as usize)?.as_deref()
    }

    fn symbolic_name(&self, token_type: i32) -> Option<&str> {
        self.symbolic_names.get(token_type as usize)?.as_deref()
    }
}
