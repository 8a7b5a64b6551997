pub type Lit = i32;

pub type Var = usize;

pub type Clause = Vec<Lit>;

pub fn to_var(lit: Lit) -> Var {
    debug_assert_ne!(lit, 0);
    lit.unsigned_abs() as Var
}

/// The `p cnf <nbvars> <nbclauses>` line, read exactly once per file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub var_count: usize,
    pub clause_count: usize,
}

/// Canonical clause form used for deduplication: literals ordered by
/// variable, duplicate literals preserved. The sort is stable, so a
/// variable occurring with both polarities keeps its input order.
pub fn canonicalize(mut clause: Clause) -> Clause {
    clause.sort_by_key(|lit| lit.unsigned_abs());
    clause
}
