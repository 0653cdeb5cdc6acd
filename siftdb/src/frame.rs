//! Six frame translation for nucleotide databases. A DNA entry is expanded to up to six
//! protein strings (three forward frames, three on the reverse complement) which are then
//! digested and searched like any protein entry.

/// Translate one codon with the standard genetic code. `U` is accepted for `T`, stop codons
/// become `*`, anything unresolvable becomes `X`. An `N` in the wobble position still
/// translates for the fourfold degenerate codons.
pub fn translate_codon(first: u8, second: u8, third: u8) -> char {
    let normalize = |base: u8| match base.to_ascii_uppercase() {
        b'U' => b'T',
        base => base,
    };
    let (a, b, c) = (normalize(first), normalize(second), normalize(third));
    if !matches!(a, b'A' | b'C' | b'G' | b'T')
        || !matches!(b, b'A' | b'C' | b'G' | b'T')
        || !matches!(c, b'A' | b'C' | b'G' | b'T' | b'N')
    {
        return 'X';
    }
    match (a, b, c) {
        (b'T', b'T', b'T' | b'C') => 'F',
        (b'T', b'T', b'A' | b'G') | (b'C', b'T', _) => 'L',
        (b'A', b'T', b'T' | b'C' | b'A') => 'I',
        (b'A', b'T', b'G') => 'M',
        (b'G', b'T', _) => 'V',
        (b'T', b'C', _) | (b'A', b'G', b'T' | b'C') => 'S',
        (b'C', b'C', _) => 'P',
        (b'A', b'C', _) => 'T',
        (b'G', b'C', _) => 'A',
        (b'T', b'A', b'T' | b'C') => 'Y',
        (b'T', b'A', b'A' | b'G') | (b'T', b'G', b'A') => '*',
        (b'C', b'A', b'T' | b'C') => 'H',
        (b'C', b'A', b'A' | b'G') => 'Q',
        (b'A', b'A', b'T' | b'C') => 'N',
        (b'A', b'A', b'A' | b'G') => 'K',
        (b'G', b'A', b'T' | b'C') => 'D',
        (b'G', b'A', b'A' | b'G') => 'E',
        (b'T', b'G', b'T' | b'C') => 'C',
        (b'T', b'G', b'G') => 'W',
        (b'C', b'G', _) | (b'A', b'G', b'A' | b'G') => 'R',
        (b'G', b'G', _) => 'G',
        _ => 'X',
    }
}

fn complement(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'T' | b'U' => b'A',
        b'G' => b'C',
        b'C' => b'G',
        _ => b'N',
    }
}

/// The reverse complement of a nucleotide string.
pub fn reverse_complement(nucleotides: &str) -> String {
    nucleotides
        .bytes()
        .rev()
        .map(|base| char::from(complement(base)))
        .collect()
}

/// Translate one reading frame, dropping the partial trailing codon.
pub fn translate(nucleotides: &str) -> String {
    nucleotides
        .as_bytes()
        .chunks_exact(3)
        .map(|codon| translate_codon(codon[0], codon[1], codon[2]))
        .collect()
}

/// All six reading frames of a nucleotide string: the three forward frames followed by the
/// three frames of the reverse complement. Frames too short for a single codon are omitted,
/// so short inputs yield fewer than six proteins.
pub fn six_frame_translation(nucleotides: &str) -> Vec<String> {
    let reverse = reverse_complement(nucleotides);
    [nucleotides, &reverse]
        .iter()
        .flat_map(|strand| (0..3).map(|frame| translate(&strand[frame.min(strand.len())..])))
        .filter(|protein| !protein.is_empty())
        .collect()
}
