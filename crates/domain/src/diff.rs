//! Line-oriented diff of two bodies, rendered for human inspection.

use std::fmt::Write;

/// Lines of unchanged context kept around each change.
const CONTEXT: usize = 2;

/// Diff lines rendered before the rest is summarized.
const MAX_RENDERED_LINES: usize = 400;

/// Largest LCS table computed before falling back to a block replacement.
const MAX_TABLE_CELLS: usize = 4_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op<'a> {
    Same(&'a str),
    Removed(&'a str),
    Added(&'a str),
}

/// Renders a diff from `old` to `new`.
///
/// Removed lines start with `-`, added lines with `+`, context with a space.
/// Runs of unchanged lines longer than the context window collapse into a
/// single `@@ N unchanged lines @@` marker. Output stops after a fixed number
/// of lines with an `@@ N more lines not shown @@` marker. Returns an empty
/// string when the bodies are identical.
#[must_use]
pub fn line_diff(old: &str, new: &str) -> String {
    if old == new {
        return String::new();
    }
    let old: Vec<&str> = old.lines().collect();
    let new: Vec<&str> = new.lines().collect();
    render(&diff_ops(&old, &new))
}

fn diff_ops<'a>(old: &[&'a str], new: &[&'a str]) -> Vec<Op<'a>> {
    let prefix = old.iter().zip(new).take_while(|(a, b)| a == b).count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let old_mid = &old[prefix..old.len() - suffix];
    let new_mid = &new[prefix..new.len() - suffix];

    let mut ops: Vec<Op<'a>> = old[..prefix].iter().map(|l| Op::Same(l)).collect();
    if old_mid.len().saturating_mul(new_mid.len()) > MAX_TABLE_CELLS {
        ops.extend(old_mid.iter().map(|l| Op::Removed(l)));
        ops.extend(new_mid.iter().map(|l| Op::Added(l)));
    } else {
        ops.extend(lcs_ops(old_mid, new_mid));
    }
    ops.extend(old[old.len() - suffix..].iter().map(|l| Op::Same(l)));
    ops
}

fn lcs_ops<'a>(old: &[&'a str], new: &[&'a str]) -> Vec<Op<'a>> {
    let (n, m) = (old.len(), new.len());
    // table[i][j] = LCS length of old[i..] and new[j..]
    let mut table = vec![0u32; (n + 1) * (m + 1)];
    let idx = |i: usize, j: usize| i * (m + 1) + j;
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[idx(i, j)] = if old[i] == new[j] {
                table[idx(i + 1, j + 1)] + 1
            } else {
                table[idx(i + 1, j)].max(table[idx(i, j + 1)])
            };
        }
    }

    let mut ops = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            ops.push(Op::Same(old[i]));
            i += 1;
            j += 1;
        } else if table[idx(i + 1, j)] >= table[idx(i, j + 1)] {
            ops.push(Op::Removed(old[i]));
            i += 1;
        } else {
            ops.push(Op::Added(new[j]));
            j += 1;
        }
    }
    ops.extend(old[i..].iter().map(|l| Op::Removed(l)));
    ops.extend(new[j..].iter().map(|l| Op::Added(l)));
    ops
}

/// Marks the ops within `CONTEXT` lines of a change, in two linear passes.
fn visibility(ops: &[Op<'_>]) -> Vec<bool> {
    let is_change = |op: &Op<'_>| !matches!(op, Op::Same(_));
    let mut visible = vec![false; ops.len()];

    let mut last_change: Option<usize> = None;
    for (i, op) in ops.iter().enumerate() {
        if is_change(op) {
            last_change = Some(i);
        }
        visible[i] = last_change.is_some_and(|c| i - c <= CONTEXT);
    }

    let mut next_change: Option<usize> = None;
    for (i, op) in ops.iter().enumerate().rev() {
        if is_change(op) {
            next_change = Some(i);
        }
        if next_change.is_some_and(|c| c - i <= CONTEXT) {
            visible[i] = true;
        }
    }
    visible
}

fn render(ops: &[Op<'_>]) -> String {
    let visible = visibility(ops);

    let mut out = String::new();
    let mut written = 0usize;
    let mut hidden = 0usize;
    for (i, op) in ops.iter().enumerate() {
        if !visible[i] {
            hidden += 1;
            continue;
        }
        if written == MAX_RENDERED_LINES {
            let remaining = visible[i..].iter().filter(|&&v| v).count();
            let _ = writeln!(out, "@@ {remaining} more lines not shown @@");
            return out;
        }
        if hidden > 0 {
            let _ = writeln!(out, "@@ {hidden} unchanged lines @@");
            hidden = 0;
        }
        let _ = match op {
            Op::Same(line) => writeln!(out, " {line}"),
            Op::Removed(line) => writeln!(out, "-{line}"),
            Op::Added(line) => writeln!(out, "+{line}"),
        };
        written += 1;
    }
    if hidden > 0 {
        let _ = writeln!(out, "@@ {hidden} unchanged lines @@");
    }
    out
}
