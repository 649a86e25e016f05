//! LR(0) items, closure/goto and the canonical LR(0) automaton.

use crate::{
    grammar::{Grammar, ProductionID, SymbolID},
    types::{Map, Set},
    util::display_fn,
};
use std::{collections::VecDeque, fmt, slice};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateID(usize);
impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}
impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
impl StateID {
    pub const INITIAL: Self = Self(0);

    pub const fn into_raw(self) -> usize {
        self.0
    }
}

/// The LR(0) item, a production with a marker position.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    pub production: ProductionID,
    pub dot: usize,
}
impl Item {
    pub const fn new(production: ProductionID, dot: usize) -> Self {
        Self { production, dot }
    }

    /// The symbol right after the marker, if any.
    pub fn next_symbol(&self, g: &Grammar) -> Option<SymbolID> {
        g.production(self.production).right().get(self.dot).copied()
    }

    /// Whether the marker has reached the end of the production.
    pub fn is_complete(&self, g: &Grammar) -> bool {
        self.dot >= g.production(self.production).right().len()
    }

    fn advance(self) -> Self {
        Self {
            dot: self.dot + 1,
            ..self
        }
    }

    // `"E -> E . + T"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            let production = g.production(self.production);
            write!(f, "{} ->", g.nonterminal_name(production.left()))?;
            for (i, symbol) in production.right().iter().enumerate() {
                if i == self.dot {
                    f.write_str(" .")?;
                }
                write!(f, " {}", g.symbol_name(*symbol))?;
            }
            if self.dot == production.right().len() {
                f.write_str(" .")?;
            }
            Ok(())
        })
    }
}

/// A set of LR(0) items in canonical form.
///
/// The items are kept sorted and deduplicated, so two sets compare (and
/// hash) equal exactly when they contain the same items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemSet {
    items: Vec<Item>,
}

impl ItemSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item, returning whether it was not present yet.
    pub fn insert(&mut self, item: Item) -> bool {
        match self.items.binary_search(&item) {
            Ok(..) => false,
            Err(i) => {
                self.items.insert(i, item);
                true
            }
        }
    }

    pub fn contains(&self, item: &Item) -> bool {
        self.items.binary_search(item).is_ok()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Item> {
        self.items.iter()
    }
}

impl FromIterator<Item> for ItemSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Item>,
    {
        let mut items: Vec<Item> = iter.into_iter().collect();
        items.sort_unstable();
        items.dedup();
        Self { items }
    }
}

impl<'a> IntoIterator for &'a ItemSet {
    type Item = &'a Item;
    type IntoIter = slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Expand the item set until every nonterminal right after a marker has its
/// productions included with the marker at the beginning.
pub fn closure(g: &Grammar, items: &ItemSet) -> ItemSet {
    let mut closed = items.clone();
    let mut added = vec![];
    loop {
        added.clear();
        for item in &closed {
            if let Some(SymbolID::N(n)) = item.next_symbol(g) {
                for production in g.productions() {
                    if production.left() != n {
                        continue;
                    }
                    added.push(Item::new(production.id(), 0));
                }
            }
        }

        let changed = added
            .drain(..)
            .fold(false, |changed, item| changed | closed.insert(item));
        if !changed {
            break;
        }
    }
    closed
}

/// Advance the marker over `symbol` and take the closure of the result.
///
/// The result is empty if no item in `items` expects `symbol`.
pub fn goto(g: &Grammar, items: &ItemSet, symbol: SymbolID) -> ItemSet {
    let moved: ItemSet = items
        .iter()
        .filter(|item| item.next_symbol(g) == Some(symbol))
        .map(|item| item.advance())
        .collect();
    if moved.is_empty() {
        return moved;
    }
    closure(g, &moved)
}

/// The order in which the outgoing symbols of a state are visited.
///
/// This only determines the numbering of the states; the shape of the
/// automaton is the same for every order.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum SymbolOrder {
    /// By symbol name.
    #[default]
    Lexicographic,
    /// Terminals before nonterminals, each in declaration order.
    Declaration,
}

impl SymbolOrder {
    fn sort(self, g: &Grammar, symbols: &mut [SymbolID]) {
        match self {
            Self::Lexicographic => {
                symbols.sort_by(|a, b| (g.symbol_name(*a), a).cmp(&(g.symbol_name(*b), b)))
            }
            Self::Declaration => symbols.sort(),
        }
    }
}

/// The symbols appearing right after a marker in `items`, in the given order.
pub fn transition_symbols(g: &Grammar, items: &ItemSet, order: SymbolOrder) -> Vec<SymbolID> {
    let symbols: Set<SymbolID> = items.iter().filter_map(|item| item.next_symbol(g)).collect();
    let mut symbols: Vec<SymbolID> = symbols.into_iter().collect();
    order.sort(g, &mut symbols);
    symbols
}

#[derive(Debug, Clone)]
pub struct State {
    id: StateID,
    items: ItemSet,
    transitions: Map<SymbolID, StateID>,
}

impl State {
    pub fn id(&self) -> StateID {
        self.id
    }

    pub fn items(&self) -> &ItemSet {
        &self.items
    }

    /// The outgoing edges, in the order they were discovered.
    pub fn transitions(&self) -> impl Iterator<Item = (SymbolID, StateID)> + '_ {
        self.transitions.iter().map(|(symbol, next)| (*symbol, *next))
    }

    pub fn transition(&self, symbol: SymbolID) -> Option<StateID> {
        self.transitions.get(&symbol).copied()
    }

    /// The items whose marker is at the end of the production.
    pub fn reduce_items<'a>(&'a self, g: &'a Grammar) -> impl Iterator<Item = &'a Item> + 'a {
        self.items.iter().filter(move |item| item.is_complete(g))
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            writeln!(f, "I{}:", self.id)?;
            for item in &self.items {
                writeln!(f, "    {}", item.display(g))?;
            }
            let mut edges: Vec<_> = self
                .transitions()
                .map(|(symbol, next)| (g.symbol_name(symbol), next))
                .collect();
            edges.sort();
            for (name, next) in edges {
                writeln!(f, "  {} => I{}", name, next)?;
            }
            Ok(())
        })
    }
}

/// The canonical collection of LR(0) item sets with their transitions.
#[derive(Debug, Clone)]
pub struct Automaton {
    states: Vec<State>,
}

impl Automaton {
    /// Build the automaton with the default symbol order.
    pub fn generate(g: &Grammar) -> Self {
        AutomatonBuilder::new(g).build()
    }

    /// All states, indexed by their ID.
    pub fn states(&self) -> &[State] {
        &self.states[..]
    }

    pub fn state(&self, id: StateID) -> &State {
        &self.states[id.0]
    }

    pub fn initial_state(&self) -> &State {
        &self.states[StateID::INITIAL.0]
    }

    /// Find the state owning exactly the given items.
    pub fn find_state(&self, items: &ItemSet) -> Option<&State> {
        self.states.iter().find(|state| state.items == *items)
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            for (i, state) in self.states.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                write!(f, "{}", state.display(g))?;
            }
            Ok(())
        })
    }
}

/// Breadth-first construction of the LR(0) automaton.
///
/// States are identified by the contents of their item sets, so a goto
/// result equal to an already discovered set reuses that state.
#[derive(Debug)]
pub struct AutomatonBuilder<'g> {
    grammar: &'g Grammar,
    order: SymbolOrder,
    states: Vec<State>,
    discovered: Map<ItemSet, StateID>,
    pending: VecDeque<StateID>,
}

impl<'g> AutomatonBuilder<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            order: SymbolOrder::default(),
            states: vec![],
            discovered: Map::default(),
            pending: VecDeque::new(),
        }
    }

    pub fn order(mut self, order: SymbolOrder) -> Self {
        self.order = order;
        self
    }

    pub fn build(mut self) -> Automaton {
        let span = tracing::trace_span!("build_automaton");
        let _entered = span.enter();

        let g = self.grammar;

        // [S' -> . S]
        let kernel: ItemSet = [Item::new(ProductionID::ACCEPT, 0)].into_iter().collect();
        self.intern(closure(g, &kernel));

        while let Some(current) = self.pending.pop_front() {
            let symbols = transition_symbols(g, &self.states[current.0].items, self.order);

            let mut transitions = Map::default();
            for symbol in symbols {
                let items = goto(g, &self.states[current.0].items, symbol);
                if items.is_empty() {
                    continue;
                }
                let next = self.intern(items);
                transitions.insert(symbol, next);
            }
            self.states[current.0].transitions = transitions;
        }

        tracing::debug!("built LR(0) automaton with {} states", self.states.len());

        Automaton {
            states: self.states,
        }
    }

    /// Return the state owning `items`, registering a new one if needed.
    fn intern(&mut self, items: ItemSet) -> StateID {
        if let Some(id) = self.discovered.get(&items) {
            return *id;
        }

        let id = StateID(self.states.len());
        tracing::trace!("discovered {:?} with {} items", id, items.len());
        self.discovered.insert(items.clone(), id);
        self.states.push(State {
            id,
            items,
            transitions: Map::default(),
        });
        self.pending.push_back(id);
        id
    }
}
