//! YANG concrete syntax: reading module text into Tree A and printing
//! Tree A back out.
//!
//! Both directions go through a generic [`Statement`] tree, the universal
//! shape of the syntax (`keyword [argument] (";" | "{" ... "}")`), so the
//! grammar lives in exactly one place on each side.

pub mod printer;
pub mod reader;

pub use printer::print_module;
pub use reader::{module_from_text, parse_statement_tree};

/// One statement of the concrete syntax.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Statement {
    pub keyword: String,
    pub argument: Option<String>,
    pub children: Vec<Statement>,
}

impl Statement {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            argument: None,
            children: Vec::new(),
        }
    }

    pub fn with_arg(keyword: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            argument: Some(argument.into()),
            children: Vec::new(),
        }
    }

    pub fn child(mut self, stmt: Statement) -> Self {
        self.children.push(stmt);
        self
    }

    /// First child with the given keyword.
    pub fn find(&self, keyword: &str) -> Option<&Statement> {
        self.children.iter().find(|c| c.keyword == keyword)
    }

    /// Argument of the first child with the given keyword.
    pub fn arg_of(&self, keyword: &str) -> Option<&str> {
        self.find(keyword).and_then(|c| c.argument.as_deref())
    }

    /// All children with the given keyword, in order.
    pub fn find_all<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a Statement> {
        self.children.iter().filter(move |c| c.keyword == keyword)
    }
}
