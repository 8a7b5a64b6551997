//! DIMACS CNF stream parsing.
//!
//! Two modes: [`read_dimacs`] requires each clause on its own line with an
//! explicit terminating `0`; [`read_dimacs_multiline`] lets clauses span
//! arbitrary newlines and tolerates the `%` comment convention found in the
//! wild. Both feed the literal stream into an [`ipasir::Facade`] and never
//! interpret it themselves.

use std::io::{BufRead, BufReader, Read};

use crate::{
    error::{Error, Result},
    ipasir::{Facade, Sink},
    types::Lit,
};

fn parse_header(parts: &[&str], line: usize) -> Result<(usize, usize)> {
    let invalid = || Error::syntax(line, "invalid header line, expected `p cnf <nbvars> <nbclauses>`");

    match parts {
        [p, cnf, vars, clauses] if p.eq_ignore_ascii_case("p") && cnf.eq_ignore_ascii_case("cnf") => {
            let var_count = vars.parse::<usize>().map_err(|_| invalid())?;
            let clause_count = clauses.parse::<usize>().map_err(|_| invalid())?;
            Ok((var_count, clause_count))
        }
        _ => Err(invalid()),
    }
}

fn parse_lit(word: &str, line: usize) -> Result<Lit> {
    word.parse::<Lit>()
        .map_err(|_| Error::syntax(line, format!("expected a literal, got {word:?}")))
}

/// Strict line mode: one header, one clause per line, each terminated by `0`.
pub fn read_dimacs<S: Sink>(
    reader: &mut impl Read,
    facade: &mut Facade<S>,
    ignore_header: bool,
) -> Result<()> {
    let mut header_seen = ignore_header;
    let mut interpreted = 0usize;
    let mut lineno = 0usize;

    for line in BufReader::new(reader).lines() {
        let line = line?;
        lineno += 1;

        if line.starts_with('p') {
            if ignore_header {
                continue;
            }
            if header_seen {
                return Err(Error::syntax(lineno, "unexpected second DIMACS header"));
            }
            let parts: Vec<&str> = line.split_whitespace().collect();
            let (var_count, clause_count) = parse_header(&parts, lineno)?;
            facade.header(var_count, clause_count)?;
            header_seen = true;
            interpreted += 1;
        } else if line.starts_with('c') || line.trim().is_empty() {
            // comment line
        } else {
            if !header_seen {
                return Err(Error::syntax(lineno, "expected header, got clause line"));
            }

            let words: Vec<&str> = line.split_whitespace().collect();
            let mut lits = Vec::with_capacity(words.len());
            for word in &words {
                lits.push(parse_lit(word, lineno)?);
            }

            match lits.split_last() {
                Some((&0, rest)) if !rest.is_empty() => {
                    if rest.contains(&0) {
                        return Err(Error::syntax(lineno, "literal must not be 0"));
                    }
                }
                Some((&0, _)) => {
                    return Err(Error::syntax(lineno, "clause contains no literals"));
                }
                _ => {
                    return Err(Error::syntax(lineno, "clause line must end with 0"));
                }
            }

            for lit in lits {
                facade.add(lit)?;
            }
            interpreted += 1;
        }
    }

    if interpreted == 0 {
        return Err(Error::syntax(lineno, "not a DIMACS CNF file"));
    }
    Ok(())
}

/// Permissive multi-line mode: literals and terminators may span newlines,
/// `%` lines are skipped, a line holding solely `%` ends the input early and
/// a missing final `0` is supplied at end-of-input.
pub fn read_dimacs_multiline<S: Sink>(
    reader: &mut impl Read,
    facade: &mut Facade<S>,
    ignore_header: bool,
) -> Result<()> {
    let mut header_seen = ignore_header;
    let mut interpreted = 0usize;
    let mut lineno = 0usize;
    let mut open_clause = false;

    for line in BufReader::new(reader).lines() {
        let line = line?;
        lineno += 1;

        let parts: Vec<&str> = line.split_whitespace().collect();

        if line.starts_with('c') || parts.is_empty() {
            continue;
        }
        if parts == ["%"] {
            // early end-of-input marker used by some generators
            break;
        }
        if line.starts_with('%') {
            continue;
        }

        if parts[0].eq_ignore_ascii_case("p") {
            if ignore_header {
                continue;
            }
            if header_seen {
                return Err(Error::syntax(lineno, "unexpected second DIMACS header"));
            }
            let (var_count, clause_count) = parse_header(&parts, lineno)?;
            facade.header(var_count, clause_count)?;
            header_seen = true;
            interpreted += 1;
            continue;
        }

        if !header_seen {
            return Err(Error::syntax(lineno, "expected header, got clause line"));
        }

        for word in &parts {
            let lit = parse_lit(word, lineno)?;
            facade.add(lit)?;
            open_clause = lit != 0;
        }
        interpreted += 1;
    }

    // implicit terminator for a final clause missing its 0
    if open_clause {
        facade.add(0)?;
    }

    if interpreted == 0 {
        return Err(Error::syntax(lineno, "not a DIMACS CNF file"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{read_dimacs, read_dimacs_multiline};
    use crate::error::{Error, Result};
    use crate::ipasir::{Facade, Sink};
    use crate::types::{Clause, Lit};

    #[derive(Default)]
    struct Collect {
        header: Option<(usize, usize)>,
        clauses: Vec<Clause>,
    }

    impl Sink for Collect {
        fn header(&mut self, var_count: usize, clause_count: usize) -> Result<()> {
            self.header = Some((var_count, clause_count));
            Ok(())
        }

        fn literal(&mut self, _lit: Lit) -> Result<()> {
            Ok(())
        }

        fn clause_end(&mut self, clause: Clause) -> Result<()> {
            self.clauses.push(clause);
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn strict(input: &str) -> Result<Collect> {
        let mut facade = Facade::new(Collect::default());
        read_dimacs(&mut input.as_bytes(), &mut facade, false)?;
        Ok(facade.into_sink())
    }

    fn multiline(input: &str) -> Result<Collect> {
        let mut facade = Facade::new(Collect::default());
        read_dimacs_multiline(&mut input.as_bytes(), &mut facade, false)?;
        Ok(facade.into_sink())
    }

    #[test]
    fn basic() {
        let sink = strict("c whatever\np cnf 2 2\n1 2 0\n1 -2 0\n").unwrap();
        assert_eq!(sink.header, Some((2, 2)));
        assert_eq!(sink.clauses, vec![vec![1, 2], vec![1, -2]]);
    }

    #[test]
    fn header_case_insensitive() {
        let sink = strict("P CNF 1 1\n1 0\n").unwrap();
        assert_eq!(sink.header, Some((1, 1)));
    }

    #[test]
    fn clause_before_header() {
        assert!(matches!(strict("1 2 0\n"), Err(Error::Syntax { line: 1, .. })));
    }

    #[test]
    fn second_header() {
        let input = "p cnf 1 1\np cnf 1 1\n1 0\n";
        assert!(matches!(strict(input), Err(Error::Syntax { line: 2, .. })));
    }

    #[test]
    fn non_terminating_zero() {
        let err = strict("p cnf 2 1\n0 1 0\n").unwrap_err();
        assert!(matches!(err, Error::Syntax { line: 2, .. }));
    }

    #[test]
    fn missing_terminator_strict() {
        assert!(strict("p cnf 2 1\n1 2\n").is_err());
    }

    #[test]
    fn bare_zero_line() {
        assert!(strict("p cnf 1 1\n0\n").is_err());
    }

    #[test]
    fn comments_and_blank_lines() {
        let sink = strict("c a\n\np cnf 1 1\nc b\n1 0\n").unwrap();
        assert_eq!(sink.clauses, vec![vec![1]]);
    }

    #[test]
    fn not_dimacs() {
        assert!(strict("c nothing here\n").is_err());
    }

    #[test]
    fn split_clause_multiline() {
        let sink = multiline("c whatever\np cnf 1 1\n1 1\n-1 -1 0\n").unwrap();
        assert_eq!(sink.clauses, vec![vec![1, 1, -1, -1]]);
    }

    #[test]
    fn implicit_final_terminator() {
        let sink = multiline("p cnf 2 2\n1 2 0\n-1 -2\n").unwrap();
        assert_eq!(sink.clauses, vec![vec![1, 2], vec![-1, -2]]);
    }

    #[test]
    fn percent_ends_input() {
        let sink = multiline("p cnf 2 1\n1 2 0\n%\n-1 0\n").unwrap();
        assert_eq!(sink.clauses, vec![vec![1, 2]]);
    }

    #[test]
    fn percent_closes_open_clause() {
        // a clause still open at the early end-of-input marker is completed
        let sink = multiline("p cnf 2 1\n1 2\n%\n").unwrap();
        assert_eq!(sink.clauses, vec![vec![1, 2]]);
    }

    #[test]
    fn multiline_rejects_clause_before_header() {
        assert!(multiline("1 0\n").is_err());
    }

    #[test]
    fn ignore_header_mode() {
        let mut facade = Facade::new(Collect::default());
        read_dimacs(&mut "p cnf 9 9\n1 0\n".as_bytes(), &mut facade, true).unwrap();
        let sink = facade.into_sink();
        assert_eq!(sink.header, None);
        assert_eq!(sink.clauses, vec![vec![1]]);
    }
}
