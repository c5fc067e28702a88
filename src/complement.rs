use crate::error::ToeholdError;

/// Watson-Crick partner of an RNA base. `T` pairs like `U`; case is ignored.
#[inline(always)]
pub fn complement_base(base: char) -> Option<char> {
    match base.to_ascii_uppercase() {
        'A' => Some('U'),
        'U' | 'T' => Some('A'),
        'G' => Some('C'),
        'C' => Some('G'),
        _ => None,
    }
}

pub fn reverse_complement(sequence: &str) -> Result<String, ToeholdError> {
    let complemented = sequence
        .chars()
        .enumerate()
        .map(|(position, base)| {
            complement_base(base).ok_or(ToeholdError::InvalidBase { base, position })
        })
        .collect::<Result<Vec<char>, _>>()?;
    Ok(complemented.into_iter().rev().collect())
}
