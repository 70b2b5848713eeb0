use crate::errors::ModelError;
use indexmap::IndexMap;
use petgraph::algo::toposort;
use petgraph::Graph;
use serde::{Deserialize, Serialize};

/// Names the engine understands without them being defined as parameters: its mathematical
/// functions, its operator-like functions and its constants.
pub(crate) const BUILTIN_SYMBOLS: [&str; 62] = [
    // trigonometric
    "sin", "cos", "tan", "cot", "sec", "csc", "asin", "acos", "atan", "acot", "asec", "acsc",
    "atan2",
    // hyperbolic
    "sinh", "cosh", "tanh", "coth", "sech", "csch", "asinh", "acosh", "atanh", "acoth", "asech",
    "acsch",
    // exponential and logarithmic
    "exp", "log", "log10", "log2", "sqrt",
    // rounding and sign
    "abs", "sign", "floor", "ceil", "round", "fact",
    // special
    "erf", "gamma", "psi", "besselj", "bessely", "besseli", "besselk",
    // complex
    "real", "imag", "conj", "arg",
    // selection and ranges
    "min", "max", "mod", "if", "range",
    // constants
    "pi", "e", "i", "j", "eps", "inf", "Inf", "NaN", "nan", "true",
];

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Parameter {
    pub name: String,
    pub expression: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Parameter {
    pub fn new(name: &str, expression: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            expression: expression.into(),
            description: description.map(str::to_string),
        }
    }
}

/// Parameters in definition order. Every expression only refers to parameters that come
/// before it, so the table can be handed to an engine and evaluated top to bottom.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct ParameterTable {
    parameters: IndexMap<String, Parameter>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Default::default()
    }

    /// Append a parameter, checking that everything its expression mentions is already known.
    pub fn define(&mut self, parameter: Parameter) -> Result<(), ModelError> {
        if self.parameters.contains_key(&parameter.name) {
            return Err(ModelError::DuplicateParameter(parameter.name));
        }
        if let Some(symbol) = unresolved_symbols(&parameter.expression, |s| self.contains(s))
            .into_iter()
            .next()
        {
            return Err(ModelError::UnresolvedSymbol {
                owner: format!("Parameter {}", parameter.name),
                symbol: symbol.to_string(),
            });
        }
        self.parameters.insert(parameter.name.clone(), parameter);

        Ok(())
    }

    /// Build a table from definitions given in any order, placing each parameter after the
    /// parameters it depends on.
    pub fn from_unordered(
        definitions: impl IntoIterator<Item = Parameter>,
    ) -> Result<Self, ModelError> {
        let mut table = Self::new();
        table.extend_unordered(definitions)?;

        Ok(table)
    }

    /// Append definitions given in any order. They may refer to parameters already in the
    /// table and to each other.
    pub fn extend_unordered(
        &mut self,
        definitions: impl IntoIterator<Item = Parameter>,
    ) -> Result<(), ModelError> {
        let mut definitions_by_name: IndexMap<String, Parameter> = IndexMap::new();
        for parameter in definitions {
            if definitions_by_name.contains_key(&parameter.name) {
                return Err(ModelError::DuplicateParameter(parameter.name));
            }
            definitions_by_name.insert(parameter.name.clone(), parameter);
        }

        let mut graph = Graph::<String, ()>::new();
        let nodes: IndexMap<&str, _> = definitions_by_name
            .keys()
            .map(|name| (name.as_str(), graph.add_node(name.clone())))
            .collect();

        let mut edges = Vec::new();
        for (name, parameter) in &definitions_by_name {
            for symbol in referenced_symbols(&parameter.expression) {
                if let Some(dependency) = nodes.get(symbol) {
                    edges.push((*dependency, nodes[name.as_str()]));
                }
            }
        }
        graph.extend_with_edges(&edges);

        let ordered = toposort(&graph, None)
            .map_err(|cycle| ModelError::CircularParameters(graph[cycle.node_id()].clone()))?;

        for node in ordered {
            let name = &graph[node];
            self.define(definitions_by_name[name.as_str()].clone())?;
        }

        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parameters.contains_key(name) || BUILTIN_SYMBOLS.contains(&name)
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.values()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

/// Identifiers an expression refers to, in order of appearance. Numbers (including exponents)
/// and unit tags in square brackets are skipped; dotted names such as `rad.rflux` are kept whole.
pub(crate) fn referenced_symbols(expression: &str) -> Vec<&str> {
    let bytes = expression.as_bytes();
    let mut symbols = vec![];
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if c == b'[' {
            while i < bytes.len() && bytes[i] != b']' {
                i += 1;
            }
            i += 1;
        } else if c.is_ascii_digit() || (c == b'.' && next_is_digit(bytes, i)) {
            i += 1;
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
            if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                let mut j = i + 1;
                if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                    j += 1;
                }
                if j < bytes.len() && bytes[j].is_ascii_digit() {
                    i = j;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
        } else if c.is_ascii_alphabetic() || c == b'_' {
            let start = i;
            while i < bytes.len()
                && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'.')
            {
                i += 1;
            }
            symbols.push(expression[start..i].trim_end_matches('.'));
        } else {
            i += 1;
        }
    }

    symbols
}

fn next_is_digit(bytes: &[u8], i: usize) -> bool {
    bytes.get(i + 1).is_some_and(u8::is_ascii_digit)
}

pub(crate) fn unresolved_symbols(expression: &str, known: impl Fn(&str) -> bool) -> Vec<&str> {
    referenced_symbols(expression)
        .into_iter()
        .filter(|symbol| !known(symbol))
        .collect()
}
