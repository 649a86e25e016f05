//! Syntax tree of a grammar file.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarSource {
    pub nonterminals: Vec<String>,
    pub terminals: Vec<String>,
    pub productions: Vec<ProductionDesc>,
    pub start: String,
}

/// `LEFT -> R1 R2 ...`, with an empty `right` for an epsilon production.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionDesc {
    pub left: String,
    pub right: Vec<String>,
}
