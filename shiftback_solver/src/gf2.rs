// Linear algebra over GF(2) on 128 unknowns.
//
// `reduce` turns a `LinearSystem` into a `SolutionSpace`: one particular
// solution plus a basis of the kernel (the directions along which the
// observations cannot tell states apart). Two eliminations are involved:
//
// - Particular solution: reduced row-echelon form of the augmented rows
//   `(coefficients | value)`. Free variables are set to zero, so each pivot
//   variable equals its row's value. A row left as `0 = 1` means the system
//   is inconsistent.
// - Kernel: the transpose, one row per unknown. Each row carries a wide
//   coefficient part (bit `e` = coefficient of that unknown in equation `e`)
//   and a 128-bit identity tag. After elimination on the wide part, rows
//   whose wide part is zero have tags `t` with `A·t = 0`; together they form
//   a basis of the kernel, of dimension `128 - rank`.
//
// Pivot search, row swap and elimination in every other row follow the
// usual dense Gaussian elimination; rows are small enough (one `u128`, or
// `ceil(n / 64)` words for the wide side) that nothing cleverer pays off.

use crate::bits::{BitVec128, STATE_BITS};
use crate::error::SolveError;

/// `coefficients · x = value`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Equation {
    pub coefficients: BitVec128,
    pub value: bool,
}

/// The equations gathered from one observation sequence.
#[derive(Clone, Debug, Default)]
pub struct LinearSystem {
    equations: Vec<Equation>,
}

impl LinearSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, equation: Equation) {
        self.equations.push(equation);
    }

    pub fn equations(&self) -> &[Equation] {
        &self.equations
    }

    pub fn len(&self) -> usize {
        self.equations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equations.is_empty()
    }
}

/// Every solution is `particular` XOR some subset of `kernel`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolutionSpace {
    pub particular: BitVec128,
    pub kernel: Vec<BitVec128>,
    pub rank: usize,
}

impl SolutionSpace {
    pub fn kernel_dim(&self) -> usize {
        self.kernel.len()
    }
}

/// Solve `system`, or report that it is inconsistent.
pub fn reduce(system: &LinearSystem) -> Result<SolutionSpace, SolveError> {
    let (particular, rank) = particular_solution(system.equations())?;
    let kernel = kernel_basis(system.equations());
    debug_assert_eq!(kernel.len() + rank, STATE_BITS as usize);
    Ok(SolutionSpace {
        particular,
        kernel,
        rank,
    })
}

/// RREF of the augmented rows. Returns the solution with all free variables
/// zero, and the rank.
fn particular_solution(equations: &[Equation]) -> Result<(BitVec128, usize), SolveError> {
    let mut rows = equations.to_vec();
    let mut pivots: Vec<u32> = Vec::with_capacity(STATE_BITS as usize);

    for col in 0..STATE_BITS {
        let top = pivots.len();
        let Some(found) = (top..rows.len()).find(|&r| rows[r].coefficients.bit(col)) else {
            continue;
        };
        rows.swap(top, found);
        let pivot = rows[top];
        for (r, row) in rows.iter_mut().enumerate() {
            if r != top && row.coefficients.bit(col) {
                row.coefficients ^= pivot.coefficients;
                row.value ^= pivot.value;
            }
        }
        pivots.push(col);
    }

    let rank = pivots.len();
    if rows[rank..].iter().any(|row| row.value) {
        return Err(SolveError::Contradiction);
    }

    let mut solution = BitVec128::ZERO;
    for (row, &col) in rows.iter().zip(&pivots) {
        if row.value {
            solution ^= BitVec128::one_hot(col);
        }
    }
    Ok((solution, rank))
}

/// One unknown's column of the coefficient matrix, tagged with the
/// combination of unknowns it currently stands for.
struct TaggedColumn {
    coefficients: Vec<u64>,
    tag: BitVec128,
}

impl TaggedColumn {
    fn bit(&self, equation: usize) -> bool {
        (self.coefficients[equation / 64] >> (equation % 64)) & 1 == 1
    }

    fn is_zero(&self) -> bool {
        self.coefficients.iter().all(|&w| w == 0)
    }

    fn xor_assign(&mut self, other: &TaggedColumn) {
        for (a, b) in self.coefficients.iter_mut().zip(&other.coefficients) {
            *a ^= *b;
        }
        self.tag ^= other.tag;
    }
}

fn kernel_basis(equations: &[Equation]) -> Vec<BitVec128> {
    let words = equations.len().div_ceil(64);
    let mut columns: Vec<TaggedColumn> = (0..STATE_BITS)
        .map(|var| {
            let mut coefficients = vec![0u64; words];
            for (e, eq) in equations.iter().enumerate() {
                if eq.coefficients.bit(var) {
                    coefficients[e / 64] |= 1 << (e % 64);
                }
            }
            TaggedColumn {
                coefficients,
                tag: BitVec128::one_hot(var),
            }
        })
        .collect();

    let mut top = 0;
    for e in 0..equations.len() {
        if top == columns.len() {
            break;
        }
        let Some(found) = (top..columns.len()).find(|&c| columns[c].bit(e)) else {
            continue;
        };
        columns.swap(top, found);
        let (above, rest) = columns.split_at_mut(top);
        let Some((pivot, below)) = rest.split_first_mut() else {
            break;
        };
        for column in above.iter_mut().chain(below.iter_mut()) {
            if column.bit(e) {
                column.xor_assign(pivot);
            }
        }
        top += 1;
    }

    columns
        .into_iter()
        .filter(|c| c.is_zero())
        .map(|c| c.tag)
        .collect()
}
