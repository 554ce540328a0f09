//! Parse the contents of a save file or table file into a [`Block`].

use std::mem::{swap, take};

use crate::block::{Block, NodeKind, BV};
use crate::report::{err, untidy, warn, ErrorKey};
use crate::token::{is_id_char, Loc, Token};

#[derive(Copy, Clone, Debug)]
enum State {
    Neutral,
    QString,
    Id,
    Comparator,
    Comment,
}

fn is_comparator_char(c: char) -> bool {
    matches!(c, '<' | '>' | '!' | '=' | '?')
}

#[derive(Debug)]
struct ParseLevel {
    block: Block,
    key: Option<Token>,
    /// The `=` between a key and its value, if one has been seen.
    comp: Option<Token>,
}

impl ParseLevel {
    fn new(loc: Loc) -> Self {
        ParseLevel { block: Block::new(loc), key: None, comp: None }
    }
}

#[derive(Debug)]
struct Parser {
    current: ParseLevel,
    stack: Vec<ParseLevel>,
    brace_error: bool,
    /// CK2 saves close their header line with a `}` at the very end of the file.
    spare_close_brace: bool,
}

impl Parser {
    fn unknown_char(c: char, loc: Loc) {
        let token = Token::from_string(c.to_string(), loc);
        let msg = format!("unrecognized character `{c}`");
        err(ErrorKey::ParseError).msg(msg).loc(token).push();
    }

    fn token(&mut self, token: Token) {
        if let Some(key) = self.current.key.take() {
            if self.current.comp.take().is_some() {
                self.current.block.add_key_value(key, BV::Value(token));
            } else {
                self.current.block.add_value(BV::Value(key));
                self.current.key = Some(token);
            }
        } else {
            self.current.key = Some(token);
        }
    }

    fn block_value(&mut self, block: Block) {
        // Like token(), but block values cannot become keys
        if let Some(key) = self.current.key.take() {
            if self.current.comp.take().is_some() {
                self.current.block.add_key_value(key, BV::Block(block));
            } else {
                self.current.block.add_value(BV::Value(key));
                self.current.block.add_value(BV::Block(block));
            }
        } else {
            self.current.block.add_value(BV::Block(block));
        }
    }

    fn comparator(&mut self, token: Token) {
        if !token.is("=") {
            let msg = format!("unsupported comparator `{token}`");
            let info = "save files only use `=`, so this is read as if it were `=`";
            err(ErrorKey::ParseError).msg(msg).info(info).loc(&token).push();
        }

        if self.current.key.is_none() {
            let msg = format!("unexpected comparator `{token}`");
            err(ErrorKey::ParseError).msg(msg).loc(token).push();
        } else {
            if self.current.comp.is_some() {
                let msg = format!("double comparator `{token}`");
                err(ErrorKey::ParseError).msg(msg).loc(&token).push();
            }
            self.current.comp = Some(token);
        }
    }

    fn end_assign(&mut self) {
        if let Some(key) = self.current.key.take() {
            if let Some(comp) = self.current.comp.take() {
                err(ErrorKey::ParseError).msg("comparator without value").loc(comp).push();
            }
            self.current.block.add_value(BV::Value(key));
        }
    }

    fn open_brace(&mut self, loc: Loc) {
        let mut new_level = ParseLevel::new(loc);
        swap(&mut new_level, &mut self.current);
        self.stack.push(new_level);
    }

    fn close_brace(&mut self, loc: Loc) {
        self.end_assign();
        if let Some(mut prev_level) = self.stack.pop() {
            swap(&mut self.current, &mut prev_level);
            if prev_level.block.node_kind() == NodeKind::Mixed {
                let msg = "block mixes bare values with `key = value` fields";
                untidy(ErrorKey::Structure).msg(msg).loc(&prev_level.block).push();
            }
            self.block_value(prev_level.block);
            if loc.column == 1 && !self.stack.is_empty() {
                let token = Token::new("}", loc);
                let msg = "possible brace error";
                let info = "This closing brace is at the start of a line but does not end a top-level item.";
                warn(ErrorKey::BracePlacement).msg(msg).info(info).loc(token).push();
            }
        } else if self.spare_close_brace {
            self.spare_close_brace = false;
        } else {
            self.brace_error = true;
            err(ErrorKey::ParseError).msg("unexpected }").loc(Token::new("}", loc)).push();
        }
    }

    fn eof(mut self) -> Option<Block> {
        self.end_assign();
        while let Some(mut prev_level) = self.stack.pop() {
            self.brace_error = true;
            let token = Token::new("{", self.current.block.loc.clone());
            err(ErrorKey::ParseError).msg("opening { was never closed").loc(token).push();
            swap(&mut self.current, &mut prev_level);
            self.block_value(prev_level.block);
        }
        // Brace errors mean we shouldn't try to use the file at all,
        // since its structure is unclear.
        if self.brace_error {
            let msg = "could not parse file due to brace mismatch";
            err(ErrorKey::ParseError).msg(msg).loc(&self.current.block).push();
            None
        } else {
            Some(self.current.block)
        }
    }
}

/// Recognize a save header such as `CK2txt` or `EU4txt` on the first line.
/// Returns the header and the remaining content.
fn split_header(content: &str) -> Option<(&str, &str)> {
    let (first, rest) = content.split_once('\n')?;
    let first = first.trim();
    if first.ends_with("txt") && first.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some((first, rest))
    } else {
        None
    }
}

#[allow(clippy::too_many_lines)] // many lines are natural for state machines
fn parse(blockloc: Loc, content: &str, mut loc: Loc, spare_close_brace: bool) -> Option<Block> {
    let mut parser = Parser {
        current: ParseLevel::new(blockloc),
        stack: Vec::new(),
        brace_error: false,
        spare_close_brace,
    };
    let mut state = State::Neutral;
    let mut token_start = loc.clone();
    let mut current_id = String::new();

    for c in content.chars() {
        match state {
            State::Neutral => {
                current_id.clear();
                if c.is_whitespace() {
                } else if c == '"' {
                    state = State::QString;
                } else if c == '#' {
                    state = State::Comment;
                } else if is_comparator_char(c) {
                    state = State::Comparator;
                    current_id.push(c);
                } else if is_id_char(c) {
                    state = State::Id;
                    current_id.push(c);
                } else if c == '{' {
                    parser.open_brace(loc.clone());
                } else if c == '}' {
                    parser.close_brace(loc.clone());
                } else {
                    Parser::unknown_char(c, loc.clone());
                }
                token_start = loc.clone();
            }
            State::Comment => {
                if c == '\n' {
                    state = State::Neutral;
                }
            }
            State::QString => {
                if c == '"' {
                    state = State::Id;
                } else if c == '\n' {
                    // Multi-line strings are legal in the games but rare enough to point out.
                    let token = Token::new(&current_id, token_start.clone());
                    untidy(ErrorKey::ParseError).msg("quoted string spans lines").loc(token).push();
                    current_id.push(c);
                } else {
                    current_id.push(c);
                }
            }
            State::Id => {
                if c == '"' {
                    // The quoted string actually becomes part of this id
                    state = State::QString;
                } else if is_id_char(c) {
                    current_id.push(c);
                } else {
                    let token = Token::from_string(take(&mut current_id), token_start.clone());
                    parser.token(token);

                    if is_comparator_char(c) {
                        current_id.push(c);
                        state = State::Comparator;
                    } else if c.is_whitespace() {
                        state = State::Neutral;
                    } else if c == '#' {
                        state = State::Comment;
                    } else if c == '{' {
                        parser.open_brace(loc.clone());
                        state = State::Neutral;
                    } else if c == '}' {
                        parser.close_brace(loc.clone());
                        state = State::Neutral;
                    } else {
                        Parser::unknown_char(c, loc.clone());
                        state = State::Neutral;
                    }
                    token_start = loc.clone();
                }
            }
            State::Comparator => {
                if is_comparator_char(c) {
                    current_id.push(c);
                } else {
                    let token = Token::from_string(take(&mut current_id), token_start.clone());
                    parser.comparator(token);

                    if c == '"' {
                        state = State::QString;
                    } else if is_id_char(c) {
                        state = State::Id;
                        current_id.push(c);
                    } else if c.is_whitespace() {
                        state = State::Neutral;
                    } else if c == '#' {
                        state = State::Comment;
                    } else if c == '{' {
                        parser.open_brace(loc.clone());
                        state = State::Neutral;
                    } else if c == '}' {
                        parser.close_brace(loc.clone());
                        state = State::Neutral;
                    } else {
                        Parser::unknown_char(c, loc.clone());
                        state = State::Neutral;
                    }
                    token_start = loc.clone();
                }
            }
        }

        if c == '\n' {
            loc.line += 1;
            loc.column = 1;
        } else {
            loc.column += 1;
        }
    }

    // Deal with state at end of file
    match state {
        State::QString => {
            let token = Token::from_string(current_id, token_start);
            err(ErrorKey::ParseError).msg("quoted string not closed").loc(&token).push();
            parser.token(token);
        }
        State::Id => {
            let token = Token::from_string(current_id, token_start);
            parser.token(token);
        }
        State::Comparator => {
            let token = Token::from_string(current_id, token_start);
            parser.comparator(token);
        }
        State::Neutral | State::Comment => (),
    }

    parser.eof()
}

/// Parse the text of a document. `blockloc` is the location of the document as a whole, usually
/// from [`Loc::for_file`].
///
/// A save header line (`CK2txt`, `EU4txt`, ...) is skipped. Returns `None` if the braces do not
/// match up, after reporting where the mismatch was found.
#[allow(clippy::module_name_repetitions)]
pub fn parse_pdx(blockloc: &Loc, content: &str) -> Option<Block> {
    let mut loc = blockloc.clone();
    loc.line = 1;
    loc.column = 1;
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    if let Some((header, rest)) = split_header(content) {
        loc.line = 2;
        parse(blockloc.clone(), rest, loc, header == "CK2txt")
    } else {
        parse(blockloc.clone(), content, loc, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Option<Block> {
        parse_pdx(&Loc::internal("test"), content)
    }

    #[test]
    fn test_structure() {
        let block = parse("a = 1 b = { 1 2 3 } c = { d = \"two words\" } # comment\ne=f").unwrap();
        assert_eq!(block.get_field_value("a").map(Token::as_str), Some("1"));
        let list = block.get_field_list("b").unwrap();
        assert_eq!(list.len(), 3);
        let c = block.get_field_block("c").unwrap();
        assert_eq!(c.get_field_value("d").map(Token::as_str), Some("two words"));
        assert!(block.field_value_is("e", "f"));
    }

    #[test]
    fn test_locations() {
        let block = parse("a = 1\n  b = 2").unwrap();
        let token = block.get_field_value("b").unwrap();
        assert_eq!((token.loc.line, token.loc.column), (2, 7));
    }

    #[test]
    fn test_ck2_header() {
        let block = parse("CK2txt\nversion=\"2.8.3.4\"\nplayer={ id=1 }\n}\n").unwrap();
        assert!(block.has_key("version"));
        assert!(block.has_key("player"));
        assert_eq!(block.get_field_value("version").unwrap().loc.line, 2);
    }

    #[test]
    fn test_eu_header() {
        let block = parse("EU4txt\ndate=1444.11.11\n").unwrap();
        assert!(block.field_value_is("date", "1444.11.11"));
        assert!(parse("EU4txt\ndate=1444.11.11\n}\n").is_none());
    }

    #[test]
    fn test_brace_mismatch() {
        assert!(parse("a = { b = 1").is_none());
        assert!(parse("a = 1 }").is_none());
    }

    #[test]
    fn test_anonymous_blocks() {
        let block = parse("history = { { a = 1 } { a = 2 } }").unwrap();
        let history = block.get_field_block("history").unwrap();
        assert_eq!(history.iter_blocks().count(), 2);
        assert_eq!(history.node_kind(), NodeKind::Collection);
    }
}
