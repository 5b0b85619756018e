//! Tag-based client grouping. Each client carries a list of tag atoms in a
//! property on its window; every tag implicitly names the set of clients so
//! tagged. Tagset expressions combine those sets into the set of clients to
//! display, serving the purpose of virtual desktops with considerably more
//! flexibility.

use crate::error::TagsetParseError;

use winsys::window::Window;

use std::collections::HashMap;
use std::collections::HashSet;

pub const WILD_TAG: &str = "*";
pub const EMPTY_TAG: &str = "0";
pub const CURRENT_TAG: &str = ".";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagExpr {
    Tag(String),
    Wild,
    Empty,
    Current,
    Union(Box<TagExpr>, Box<TagExpr>),
    Difference(Box<TagExpr>, Box<TagExpr>),
    Intersection(Box<TagExpr>, Box<TagExpr>),
    Complement(Box<TagExpr>),
}

impl TagExpr {
    fn precedence(&self) -> u8 {
        match self {
            TagExpr::Union(..) => 1,
            TagExpr::Difference(..) => 2,
            TagExpr::Intersection(..) => 3,
            TagExpr::Complement(..) => 4,
            _ => 5,
        }
    }

    pub fn is_complement(&self) -> bool {
        matches!(self, TagExpr::Complement(..))
    }

    /// Canonical string form: single-space separated binary operators,
    /// parentheses only where precedence demands them.
    pub fn unparse(&self) -> String {
        fn paren(
            expr: &TagExpr,
            min_precedence: u8,
        ) -> String {
            if expr.precedence() < min_precedence {
                format!("({})", expr.unparse())
            } else {
                expr.unparse()
            }
        }

        match self {
            TagExpr::Tag(name) => name.clone(),
            TagExpr::Wild => WILD_TAG.to_owned(),
            TagExpr::Empty => EMPTY_TAG.to_owned(),
            TagExpr::Current => CURRENT_TAG.to_owned(),
            TagExpr::Union(lhs, rhs) => {
                format!("{} | {}", paren(lhs, 1), paren(rhs, 2))
            },
            TagExpr::Difference(lhs, rhs) => {
                format!("{} \\ {}", paren(lhs, 2), paren(rhs, 3))
            },
            TagExpr::Intersection(lhs, rhs) => {
                format!("{} & {}", paren(lhs, 3), paren(rhs, 4))
            },
            TagExpr::Complement(arg) => format!("~{}", paren(arg, 4)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Union,
    Difference,
    Intersection,
    Complement,
    LParen,
    RParen,
}

fn tokenize(spec: &str) -> Result<Vec<(Token, usize)>, TagsetParseError> {
    let mut tokens = Vec::new();
    let mut chars = spec.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        let token = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            },
            '|' | '∪' => Token::Union,
            '\\' | '∖' => Token::Difference,
            '&' | '∩' => Token::Intersection,
            '~' | '∁' => Token::Complement,
            '(' => Token::LParen,
            ')' => Token::RParen,
            _ => {
                let mut ident = String::new();

                while let Some(&(_, c)) = chars.peek() {
                    if c.is_whitespace() || "|∪\\∖&∩~∁()".contains(c) {
                        break;
                    }

                    ident.push(c);
                    chars.next();
                }

                tokens.push((Token::Ident(ident), position));
                continue;
            },
        };

        tokens.push((token, position));
        chars.next();
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    cursor: usize,
    len: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|(token, _)| token)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.cursor)
            .map_or(self.len, |&(_, position)| position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).map(|(token, _)| token.clone());
        self.cursor += 1;
        token
    }

    fn error(
        &self,
        message: impl Into<String>,
    ) -> TagsetParseError {
        TagsetParseError {
            message: message.into(),
            position: self.position(),
        }
    }

    // expr -> diff ('|' diff)*
    fn expr(&mut self) -> Result<TagExpr, TagsetParseError> {
        let mut lhs = self.diff()?;

        while self.peek() == Some(&Token::Union) {
            self.advance();
            let rhs = self.diff()?;
            lhs = TagExpr::Union(Box::new(lhs), Box::new(rhs));
        }

        Ok(lhs)
    }

    // diff -> term ('\' term)*
    fn diff(&mut self) -> Result<TagExpr, TagsetParseError> {
        let mut lhs = self.term()?;

        while self.peek() == Some(&Token::Difference) {
            self.advance();
            let rhs = self.term()?;
            lhs = TagExpr::Difference(Box::new(lhs), Box::new(rhs));
        }

        Ok(lhs)
    }

    // term -> comp ('&' comp)*
    fn term(&mut self) -> Result<TagExpr, TagsetParseError> {
        let mut lhs = self.comp()?;

        while self.peek() == Some(&Token::Intersection) {
            self.advance();
            let rhs = self.comp()?;
            lhs = TagExpr::Intersection(Box::new(lhs), Box::new(rhs));
        }

        Ok(lhs)
    }

    // comp -> '~' comp | fact
    fn comp(&mut self) -> Result<TagExpr, TagsetParseError> {
        if self.peek() == Some(&Token::Complement) {
            self.advance();
            Ok(TagExpr::Complement(Box::new(self.comp()?)))
        } else {
            self.fact()
        }
    }

    // fact -> '(' expr ')' | ident
    fn fact(&mut self) -> Result<TagExpr, TagsetParseError> {
        let position = self.position();

        match self.advance() {
            Some(Token::LParen) => {
                let expr = self.expr()?;

                match self.advance() {
                    Some(Token::RParen) => Ok(expr),
                    _ => Err(TagsetParseError {
                        message: "unmatched parenthesis".to_owned(),
                        position,
                    }),
                }
            },
            Some(Token::Ident(name)) => Ok(match name.as_str() {
                WILD_TAG => TagExpr::Wild,
                EMPTY_TAG | "∅" => TagExpr::Empty,
                CURRENT_TAG => TagExpr::Current,
                _ => TagExpr::Tag(name),
            }),
            Some(token) => Err(TagsetParseError {
                message: format!("unexpected token {:?}", token),
                position,
            }),
            None => Err(TagsetParseError {
                message: "unexpected end of expression".to_owned(),
                position,
            }),
        }
    }
}

pub fn parse_tagset(spec: &str) -> Result<TagExpr, TagsetParseError> {
    let mut parser = Parser {
        tokens: tokenize(spec)?,
        cursor: 0,
        len: spec.len(),
    };

    let expr = parser.expr()?;

    if parser.peek().is_some() {
        return Err(parser.error("trailing garbage"));
    }

    Ok(expr)
}

/// The visible sets displayed so far. The bottom element is the initial
/// all-clients set and is never replaced; tagset switches push, and
/// nothing in the core pops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagsetStack {
    stack: Vec<HashSet<Window>>,
}

impl TagsetStack {
    pub fn new(initial: HashSet<Window>) -> Self {
        Self {
            stack: vec![initial],
        }
    }

    pub fn top(&self) -> &HashSet<Window> {
        self.stack.last().unwrap()
    }

    pub fn push(
        &mut self,
        set: HashSet<Window>,
    ) {
        self.stack.push(set);
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn insert(
        &mut self,
        window: Window,
    ) {
        self.stack.last_mut().unwrap().insert(window);
    }

    pub fn remove(
        &mut self,
        window: Window,
    ) {
        for set in &mut self.stack {
            set.remove(&window);
        }
    }

    pub fn contains(
        &self,
        window: Window,
    ) -> bool {
        self.top().contains(&window)
    }
}

/// Per-tag client sets and the evaluation machinery over them. Tags are
/// kept by name; the manager translates to and from atoms at the
/// property boundary.
pub struct TagEngine {
    tagsets: HashMap<String, HashSet<Window>>,
}

impl TagEngine {
    pub fn new() -> Self {
        Self {
            tagsets: HashMap::new(),
        }
    }

    pub fn note_tags(
        &mut self,
        window: Window,
        tags: &[String],
    ) {
        for tag in tags {
            self.tagsets
                .entry(tag.clone())
                .or_insert_with(HashSet::new)
                .insert(window);
        }
    }

    pub fn forget_tags(
        &mut self,
        window: Window,
    ) {
        for tagset in self.tagsets.values_mut() {
            tagset.remove(&window);
        }

        self.tagsets.retain(|_, tagset| !tagset.is_empty());
    }

    pub fn tagged(
        &self,
        tag: &str,
    ) -> HashSet<Window> {
        self.tagsets.get(tag).cloned().unwrap_or_default()
    }

    pub fn sticky_set(&self) -> HashSet<Window> {
        self.tagged(WILD_TAG)
    }

    pub fn is_known_tag(
        &self,
        tag: &str,
    ) -> bool {
        self.tagsets
            .get(tag)
            .map_or(false, |tagset| !tagset.is_empty())
    }

    /// Evaluate an expression into a set of windows.
    ///
    /// Sticky (`*`-tagged) clients are injected into named tagsets and
    /// `.` in positive positions only; the complement operand and the
    /// right-hand side of a difference evaluate without injection, so
    /// hiding `docs` does not hide a sticky client that never carried
    /// that tag. Complement is taken over the full universe of managed
    /// clients, tagged or not.
    pub fn evaluate(
        &self,
        expr: &TagExpr,
        universe: &HashSet<Window>,
        current: &HashSet<Window>,
        implicit: &dyn Fn(&str) -> HashSet<Window>,
    ) -> HashSet<Window> {
        self.eval_with(expr, universe, current, implicit, true)
    }

    fn eval_with(
        &self,
        expr: &TagExpr,
        universe: &HashSet<Window>,
        current: &HashSet<Window>,
        implicit: &dyn Fn(&str) -> HashSet<Window>,
        positive: bool,
    ) -> HashSet<Window> {
        match expr {
            TagExpr::Tag(name) => {
                let mut set = match self.tagsets.get(name.as_str()) {
                    Some(tagset) if !tagset.is_empty() => tagset.clone(),
                    _ => implicit(name),
                };

                if positive {
                    set.extend(self.sticky_set());
                }

                set.retain(|window| universe.contains(window));
                set
            },
            TagExpr::Wild => {
                let mut set = self.sticky_set();
                set.retain(|window| universe.contains(window));
                set
            },
            TagExpr::Empty => HashSet::new(),
            TagExpr::Current => {
                let mut set = current.clone();

                if positive {
                    set.extend(self.sticky_set());
                }

                set.retain(|window| universe.contains(window));
                set
            },
            TagExpr::Union(lhs, rhs) => {
                let mut set = self.eval_with(lhs, universe, current, implicit, positive);
                set.extend(self.eval_with(rhs, universe, current, implicit, positive));
                set
            },
            TagExpr::Intersection(lhs, rhs) => {
                let lhs = self.eval_with(lhs, universe, current, implicit, positive);
                let rhs = self.eval_with(rhs, universe, current, implicit, positive);

                lhs.intersection(&rhs).copied().collect()
            },
            TagExpr::Difference(lhs, rhs) => {
                let lhs = self.eval_with(lhs, universe, current, implicit, positive);
                let rhs = self.eval_with(rhs, universe, current, implicit, !positive);

                lhs.difference(&rhs).copied().collect()
            },
            TagExpr::Complement(arg) => {
                let arg = self.eval_with(arg, universe, current, implicit, !positive);

                universe.difference(&arg).copied().collect()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_implicit(_: &str) -> HashSet<Window> {
        HashSet::new()
    }

    fn set(windows: &[Window]) -> HashSet<Window> {
        windows.iter().copied().collect()
    }

    fn engine() -> (TagEngine, HashSet<Window>) {
        // A=1 work, B=2 work docs, C=3 mail, D=4 untagged, S=5 sticky
        let mut engine = TagEngine::new();
        engine.note_tags(1, &["work".to_owned()]);
        engine.note_tags(2, &["work".to_owned(), "docs".to_owned()]);
        engine.note_tags(3, &["mail".to_owned()]);
        engine.note_tags(5, &["*".to_owned()]);

        (engine, set(&[1, 2, 3, 4, 5]))
    }

    fn eval(
        engine: &TagEngine,
        universe: &HashSet<Window>,
        spec: &str,
    ) -> HashSet<Window> {
        engine.evaluate(
            &parse_tagset(spec).unwrap(),
            universe,
            &HashSet::new(),
            &no_implicit,
        )
    }

    #[test]
    fn parse_respects_precedence() {
        assert_eq!(
            parse_tagset("a | b \\ c & ~d").unwrap(),
            TagExpr::Union(
                Box::new(TagExpr::Tag("a".to_owned())),
                Box::new(TagExpr::Difference(
                    Box::new(TagExpr::Tag("b".to_owned())),
                    Box::new(TagExpr::Intersection(
                        Box::new(TagExpr::Tag("c".to_owned())),
                        Box::new(TagExpr::Complement(Box::new(TagExpr::Tag(
                            "d".to_owned()
                        )))),
                    )),
                )),
            )
        );
    }

    #[test]
    fn binary_operators_are_left_associative() {
        assert_eq!(
            parse_tagset("a \\ b \\ c").unwrap(),
            TagExpr::Difference(
                Box::new(TagExpr::Difference(
                    Box::new(TagExpr::Tag("a".to_owned())),
                    Box::new(TagExpr::Tag("b".to_owned())),
                )),
                Box::new(TagExpr::Tag("c".to_owned())),
            )
        );
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(
            parse_tagset("(a | b) & c").unwrap(),
            TagExpr::Intersection(
                Box::new(TagExpr::Union(
                    Box::new(TagExpr::Tag("a".to_owned())),
                    Box::new(TagExpr::Tag("b".to_owned())),
                )),
                Box::new(TagExpr::Tag("c".to_owned())),
            )
        );
    }

    #[test]
    fn unicode_operator_aliases_parse() {
        assert_eq!(parse_tagset("a ∪ b").unwrap(), parse_tagset("a | b").unwrap());
        assert_eq!(parse_tagset("a ∖ b").unwrap(), parse_tagset("a \\ b").unwrap());
        assert_eq!(parse_tagset("a ∩ b").unwrap(), parse_tagset("a & b").unwrap());
        assert_eq!(parse_tagset("∁a").unwrap(), parse_tagset("~a").unwrap());
    }

    #[test]
    fn parse_errors_carry_position() {
        assert!(parse_tagset("a |").is_err());
        assert!(parse_tagset("(a | b").is_err());
        assert!(parse_tagset("a b").is_err());
        assert!(parse_tagset("").is_err());

        let err = parse_tagset("work | | mail").unwrap_err();
        assert_eq!(err.position, 7);
    }

    #[test]
    fn unparse_is_stable_under_reparsing() {
        for spec in &[
            "work",
            "work | mail",
            "work \\ docs | mail",
            "(work | mail) & ~docs",
            "~(a | b) \\ c",
            "a & b & c",
            "a \\ (b \\ c)",
            "~~a",
            ". | 0 | *",
        ] {
            let parsed = parse_tagset(spec).unwrap();
            assert_eq!(
                parse_tagset(&parsed.unparse()).unwrap(),
                parsed,
                "unparse of {:?} not stable (got {:?})",
                spec,
                parsed.unparse()
            );
        }
    }

    #[test]
    fn difference_union_scenario() {
        let (engine, universe) = engine();

        // work \ docs | mail -> {A, C} plus the sticky client
        assert_eq!(
            eval(&engine, &universe, "work \\ docs | mail"),
            set(&[1, 3, 5])
        );
    }

    #[test]
    fn sticky_client_appears_in_foreign_tagsets() {
        let (engine, universe) = engine();

        // Nothing is tagged chat; the sticky client shows anyway.
        assert_eq!(eval(&engine, &universe, "chat"), set(&[5]));
        assert_eq!(eval(&engine, &universe, "mail"), set(&[3, 5]));
    }

    #[test]
    fn sticky_client_survives_difference() {
        let (engine, universe) = engine();

        // The sticky client is not docs-tagged, so hiding docs does not
        // hide it.
        assert_eq!(eval(&engine, &universe, "work \\ docs"), set(&[1, 5]));
    }

    #[test]
    fn empty_set_is_strictly_empty() {
        let (engine, universe) = engine();

        assert_eq!(eval(&engine, &universe, "0"), set(&[]));
    }

    #[test]
    fn complement_of_empty_is_universe() {
        let (engine, universe) = engine();

        assert_eq!(eval(&engine, &universe, "~0"), universe);
    }

    #[test]
    fn wild_is_proper_subset_of_complement_of_empty() {
        let (engine, universe) = engine();

        let wild = eval(&engine, &universe, "*");
        let everything = eval(&engine, &universe, "~0");

        assert_eq!(wild, set(&[5]));
        assert!(wild.is_subset(&everything));
        assert_ne!(wild, everything);
    }

    #[test]
    fn complement_includes_untagged_clients() {
        let (engine, universe) = engine();

        // ~work: everything not work-tagged, untagged client included.
        assert_eq!(eval(&engine, &universe, "~work"), set(&[3, 4, 5]));
    }

    #[test]
    fn double_complement_restores_sticky_injection() {
        let (engine, universe) = engine();

        assert_eq!(eval(&engine, &universe, "~~work"), set(&[1, 2, 5]));
    }

    #[test]
    fn current_set_atom_reflects_displayed_clients() {
        let (engine, universe) = engine();
        let current = set(&[1, 2]);

        let result = engine.evaluate(
            &parse_tagset(". \\ docs").unwrap(),
            &universe,
            &current,
            &no_implicit,
        );

        assert_eq!(result, set(&[1, 5]));
    }

    #[test]
    fn unknown_tag_falls_back_to_implicit_sets() {
        let (engine, universe) = engine();

        let implicit = |name: &str| {
            if name == "xterm" {
                set(&[4])
            } else {
                HashSet::new()
            }
        };

        let result = engine.evaluate(
            &parse_tagset("xterm").unwrap(),
            &universe,
            &HashSet::new(),
            &implicit,
        );

        assert_eq!(result, set(&[4, 5]));
    }

    #[test]
    fn forgetting_tags_removes_windows_from_all_sets() {
        let (mut engine, universe) = engine();

        engine.forget_tags(2);
        assert_eq!(eval(&engine, &universe, "docs"), set(&[5]));
        assert_eq!(eval(&engine, &universe, "work"), set(&[1, 5]));
    }

    #[test]
    fn switching_to_same_expression_is_idempotent() {
        let (engine, universe) = engine();

        let first = eval(&engine, &universe, "work | mail");
        let second = eval(&engine, &universe, "work | mail");
        assert_eq!(first, second);
    }

    #[test]
    fn tagset_stack_retains_bottom() {
        let mut stack = TagsetStack::new(set(&[1, 2, 3]));

        stack.push(set(&[1]));
        stack.push(set(&[2]));

        assert_eq!(stack.depth(), 3);
        assert_eq!(stack.top(), &set(&[2]));

        stack.remove(2);
        assert_eq!(stack.top(), &set(&[]));
        assert!(!stack.contains(2));
    }
}
