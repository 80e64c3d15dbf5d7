//! Pest-backed parser producing the environment AST.
use crate::ast::{Assignment, Expr, Program};
use crate::error::EnvLangError;
use pest::error::LineColLocation;
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use serde_json::{Number, Value};

#[derive(pest_derive::Parser)]
#[grammar = "grammar.pest"]
struct EnvParser;

/// Parse a whole environment source into a [`Program`].
pub fn parse_program(source: &str) -> Result<Program, EnvLangError> {
    let mut pairs = EnvParser::parse(Rule::program, source).map_err(syntax_error)?;
    let program = pairs.next().ok_or(EnvLangError::Malformed("program"))?;

    let mut statements = Vec::new();
    for pair in program.into_inner() {
        if pair.as_rule() == Rule::statement {
            statements.push(build_assignment(pair)?);
        }
    }

    Ok(Program { statements })
}

fn syntax_error(err: pest::error::Error<Rule>) -> EnvLangError {
    let (line, column) = match err.line_col {
        LineColLocation::Pos(pos) => pos,
        LineColLocation::Span(start, _) => start,
    };
    EnvLangError::Syntax {
        line,
        column,
        message: err.variant.message().to_string(),
    }
}

fn next_pair<'i>(
    pairs: &mut Pairs<'i, Rule>,
    expected: &'static str,
) -> Result<Pair<'i, Rule>, EnvLangError> {
    pairs.next().ok_or(EnvLangError::Malformed(expected))
}

fn line_of(pair: &Pair<'_, Rule>) -> usize {
    pair.as_span().start_pos().line_col().0
}

fn build_assignment(pair: Pair<'_, Rule>) -> Result<Assignment, EnvLangError> {
    let line = line_of(&pair);
    let mut inner = pair.into_inner();
    let name = next_pair(&mut inner, "assignment target")?.as_str().to_string();
    let value = build_expr(next_pair(&mut inner, "assignment value")?, line)?;
    Ok(Assignment { name, value, line })
}

fn build_expr(pair: Pair<'_, Rule>, line: usize) -> Result<Expr, EnvLangError> {
    let mut terms = pair.into_inner();
    let mut expr = build_term(next_pair(&mut terms, "term")?, line)?;
    for rhs in terms {
        expr = Expr::Add(Box::new(expr), Box::new(build_term(rhs, line)?));
    }
    Ok(expr)
}

fn build_term(pair: Pair<'_, Rule>, line: usize) -> Result<Expr, EnvLangError> {
    let mut inner = pair.into_inner();
    let mut expr = build_atom(next_pair(&mut inner, "atom")?, line)?;
    for subscript in inner {
        let mut index = subscript.into_inner();
        let index = build_expr(next_pair(&mut index, "subscript index")?, line)?;
        expr = Expr::Subscript {
            target: Box::new(expr),
            index: Box::new(index),
        };
    }
    Ok(expr)
}

fn build_atom(pair: Pair<'_, Rule>, line: usize) -> Result<Expr, EnvLangError> {
    match pair.as_rule() {
        Rule::string => {
            let raw = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
            Ok(Expr::Literal(Value::String(unescape(raw))))
        }
        Rule::number => parse_number(pair.as_str(), line).map(Expr::Literal),
        Rule::boolean => Ok(Expr::Literal(Value::Bool(pair.as_str().eq_ignore_ascii_case("true")))),
        Rule::null => Ok(Expr::Literal(Value::Null)),
        Rule::list => pair
            .into_inner()
            .map(|item| build_expr(item, line))
            .collect::<Result<Vec<_>, _>>()
            .map(Expr::List),
        Rule::dict => {
            let mut entries = Vec::new();
            for entry in pair.into_inner() {
                let mut kv = entry.into_inner();
                let key = build_expr(next_pair(&mut kv, "dict key")?, line)?;
                let value = build_expr(next_pair(&mut kv, "dict value")?, line)?;
                entries.push((key, value));
            }
            Ok(Expr::Dict(entries))
        }
        Rule::call => {
            let mut inner = pair.into_inner();
            let function = next_pair(&mut inner, "function name")?.as_str().to_string();
            let args = inner
                .map(|arg| build_expr(arg, line))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Expr::Call { function, args })
        }
        Rule::name => Ok(Expr::Name(pair.as_str().to_string())),
        Rule::expr => build_expr(pair, line),
        _ => Err(EnvLangError::Malformed("atom")),
    }
}

fn parse_number(literal: &str, line: usize) -> Result<Value, EnvLangError> {
    let invalid = || EnvLangError::Number {
        literal: literal.to_string(),
        line,
    };
    if literal.contains('.') {
        let value: f64 = literal.parse().map_err(|_| invalid())?;
        Number::from_f64(value).map(Value::Number).ok_or_else(invalid)
    } else {
        literal
            .parse::<i64>()
            .map(|n| Value::Number(n.into()))
            .map_err(|_| invalid())
    }
}

/// Resolve backslash escapes; unknown escapes are kept verbatim.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_literals() {
        let program = parse_program("a = 1\nb = 'two'\nc = 3.5\nd = True\ne = None\n").unwrap();
        let values: Vec<_> = program.statements.iter().map(|s| s.value.clone()).collect();
        assert_eq!(
            values,
            vec![
                Expr::Literal(json!(1)),
                Expr::Literal(json!("two")),
                Expr::Literal(json!(3.5)),
                Expr::Literal(json!(true)),
                Expr::Literal(Value::Null),
            ]
        );
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let source = "# leading comment\n\nbase = 'http://localhost'  # trailing\n\n";
        let program = parse_program(source).unwrap();
        assert_eq!(program.statements.len(), 1);
        assert_eq!(program.statements[0].name, "base");
        assert_eq!(program.statements[0].line, 3);
    }

    #[test]
    fn test_multiline_dict() {
        let source = "headers = {\n    'Accept': 'application/json',\n    'X-Id': 7,\n}\n";
        let program = parse_program(source).unwrap();
        match &program.statements[0].value {
            Expr::Dict(entries) => assert_eq!(entries.len(), 2),
            other => panic!("expected dict, got {:?}", other),
        }
    }

    #[test]
    fn test_concatenation_and_subscript() {
        let program = parse_program("url = base + '/users' + ids[0]").unwrap();
        match &program.statements[0].value {
            Expr::Add(lhs, rhs) => {
                assert!(matches!(**lhs, Expr::Add(_, _)));
                assert!(matches!(**rhs, Expr::Subscript { .. }));
            }
            other => panic!("expected add, got {:?}", other),
        }
    }

    #[test]
    fn test_keywords_need_word_boundary() {
        let program = parse_program("x = Trueish").unwrap();
        assert_eq!(program.statements[0].value, Expr::Name("Trueish".to_string()));
    }

    #[test]
    fn test_escapes() {
        assert_eq!(unescape(r"a\nb\\c\'d\q"), "a\nb\\c'd\\q");
    }

    #[test]
    fn test_syntax_error_reports_position() {
        let err = parse_program("ok = 1\nimport os\n").unwrap_err();
        match err {
            EnvLangError::Syntax { line, .. } => assert_eq!(line, 2),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }
}
