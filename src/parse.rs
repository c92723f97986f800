//! Parse pest pairs into a typed command sequence
//!
//! Pen state is threaded through the walk: `PU`/`PD` set it, every other
//! opcode inherits it, and a sequence starts pen-up.

use glam::{IVec2, ivec2};
use miette::NamedSource;
use pest::Parser;
use pest::iterators::Pair;

use crate::command::{Command, CommandKind, CommandSequence, Pen};
use crate::errors::ParseError;
use crate::{HpglParser, Rule};

/// Parse the full text of an HPGL file into a command sequence.
///
/// `name` labels the source in diagnostics (a filename, or `"<input>"`).
pub fn parse(name: &str, source: &str) -> Result<CommandSequence, ParseError> {
    let pairs = HpglParser::parse(Rule::program, source)
        .map_err(|e| pest_error(name, source, e))?;

    let mut commands = Vec::new();
    let mut pen = Pen::Up;
    for pair in pairs {
        if pair.as_rule() == Rule::program {
            for inner in pair.into_inner() {
                if inner.as_rule() == Rule::statement {
                    let cmd = parse_statement(name, source, inner, pen)?;
                    pen = cmd.pen;
                    commands.push(cmd);
                }
            }
        }
    }
    Ok(CommandSequence::new(commands))
}

fn parse_statement(
    name: &str,
    source: &str,
    pair: Pair<Rule>,
    pen: Pen,
) -> Result<Command, ParseError> {
    let mut opcode = "";
    let mut values: Vec<(i32, pest::Span)> = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::opcode => opcode = inner.as_str(),
            Rule::coord_list => {
                for int in inner.into_inner() {
                    let text = int.as_str();
                    let int_span = int.as_span();
                    let value = text.parse::<i32>().map_err(|_| ParseError::InvalidNumber {
                        value: text.to_string(),
                        src: NamedSource::new(name, source.to_string()),
                        span: span_of(int_span),
                    })?;
                    values.push((value, int_span));
                }
            }
            _ => {}
        }
    }

    let kind = match opcode {
        "PU" => CommandKind::Move {
            points: pair_points(name, source, opcode, &values)?,
        },
        "PD" => CommandKind::Draw {
            points: pair_points(name, source, opcode, &values)?,
        },
        other => {
            let bytes = other.as_bytes();
            CommandKind::Opaque {
                // The grammar only admits exactly two uppercase letters.
                opcode: [bytes[0], bytes[1]],
                params: values.iter().map(|(v, _)| *v).collect(),
            }
        }
    };

    let pen = match kind {
        CommandKind::Move { .. } => Pen::Up,
        CommandKind::Draw { .. } => Pen::Down,
        CommandKind::Opaque { .. } => pen,
    };

    Ok(Command { kind, pen })
}

/// Pair a flat coordinate list into points, rejecting an odd trailing value
fn pair_points(
    name: &str,
    source: &str,
    opcode: &str,
    values: &[(i32, pest::Span)],
) -> Result<Vec<IVec2>, ParseError> {
    if values.len() % 2 != 0 {
        // values is non-empty here; the odd count guarantees a last element.
        let last = &values[values.len() - 1];
        return Err(ParseError::OddCoordinate {
            opcode: opcode.to_string(),
            count: values.len(),
            src: NamedSource::new(name, source.to_string()),
            span: span_of(last.1),
        });
    }
    Ok(values
        .chunks_exact(2)
        .map(|pair| ivec2(pair[0].0, pair[1].0))
        .collect())
}

fn span_of(span: pest::Span) -> miette::SourceSpan {
    (span.start(), span.end() - span.start()).into()
}

/// Map a pest failure (unreadable token, missing terminator) to a
/// malformed-command diagnostic at the offending offset
fn pest_error(name: &str, source: &str, error: pest::error::Error<Rule>) -> ParseError {
    let offset = match error.location {
        pest::error::InputLocation::Pos(pos) => pos,
        pest::error::InputLocation::Span((start, _)) => start,
    };
    ParseError::MalformedCommand {
        detail: error.variant.message().to_string(),
        src: NamedSource::new(name, source.to_string()),
        span: (offset, 0).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> CommandSequence {
        parse("<test>", source).expect("parse should succeed")
    }

    #[test]
    fn parses_move_and_draw() {
        let seq = parse_ok("PU0,0;PD100,100,200,200;");
        assert_eq!(seq.len(), 2);
        assert_eq!(
            seq.get(0).unwrap().kind,
            CommandKind::Move {
                points: vec![ivec2(0, 0)]
            }
        );
        assert_eq!(
            seq.get(1).unwrap().kind,
            CommandKind::Draw {
                points: vec![ivec2(100, 100), ivec2(200, 200)]
            }
        );
    }

    #[test]
    fn pen_state_threads_through_opaque_commands() {
        let seq = parse_ok("IN;PD10,10;SP1;PU20,20;VS4;");
        let pens: Vec<Pen> = seq.iter().map(|c| c.pen).collect();
        // Starts up, IN inherits, PD sets down, SP inherits down, PU sets
        // up, VS inherits up.
        assert_eq!(pens, vec![Pen::Up, Pen::Down, Pen::Down, Pen::Up, Pen::Up]);
    }

    #[test]
    fn unknown_opcodes_are_retained() {
        let seq = parse_ok("IN;SP1;");
        assert_eq!(
            seq.get(0).unwrap().kind,
            CommandKind::Opaque {
                opcode: *b"IN",
                params: vec![]
            }
        );
        assert_eq!(
            seq.get(1).unwrap().kind,
            CommandKind::Opaque {
                opcode: *b"SP",
                params: vec![1]
            }
        );
    }

    #[test]
    fn negative_coordinates_parse() {
        let seq = parse_ok("PU-5,-10;");
        assert_eq!(
            seq.get(0).unwrap().kind,
            CommandKind::Move {
                points: vec![ivec2(-5, -10)]
            }
        );
    }

    #[test]
    fn whitespace_between_tokens_is_insignificant() {
        let seq = parse_ok("PU 0 , 0 ;\n  PD 10,10 ;\n");
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn empty_input_is_an_empty_sequence() {
        assert!(parse_ok("").is_empty());
    }

    #[test]
    fn missing_terminator_is_malformed() {
        let err = parse("<test>", "PD100,100").unwrap_err();
        assert!(matches!(err, ParseError::MalformedCommand { .. }));
    }

    #[test]
    fn unreadable_token_is_malformed() {
        let err = parse("<test>", "PDabc;").unwrap_err();
        assert!(matches!(err, ParseError::MalformedCommand { .. }));
    }

    #[test]
    fn lowercase_opcode_is_malformed() {
        let err = parse("<test>", "pd100,100;").unwrap_err();
        assert!(matches!(err, ParseError::MalformedCommand { .. }));
    }

    #[test]
    fn odd_coordinate_count_is_rejected() {
        let err = parse("<test>", "PD100,100,200;").unwrap_err();
        match err {
            ParseError::OddCoordinate { opcode, count, .. } => {
                assert_eq!(opcode, "PD");
                assert_eq!(count, 3);
            }
            other => panic!("expected OddCoordinate, got {other:?}"),
        }
    }

    #[test]
    fn oversized_number_is_invalid() {
        let err = parse("<test>", "PD99999999999,0;").unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { .. }));
    }
}
