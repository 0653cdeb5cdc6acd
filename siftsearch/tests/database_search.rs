#![allow(clippy::missing_panics_doc)]
//! Integration test for the full pipeline: FASTA file, binary index, enzymatic digestion,
//! two phase MOWSE scoring, peak matching.
use std::io::Write;

use siftcore::chemistry::{MassMode, PROTON_MASS};
use siftcore::quantities::Tolerance;
use siftcore::sequence::{AminoAcid, DigestParameters, EnzymeRegistry, digest};
use siftdb::SequenceDatabase;
use siftsearch::{
    MatchResult, MowseAccumulator, Peak, PeakMatchEngine, PeakSet, SearchLimits, SearchProgress,
};

const FASTA: &str = ">one first protein\nGGGKAAAR\n>two second protein\nVVVKGGEEKLLLR\n>three third protein\nMKPEPTIDEKR\n";

fn protein_mass(sequence: &str) -> f64 {
    let water = 18.010565;
    sequence
        .chars()
        .map(|c| {
            AminoAcid::try_from(c)
                .unwrap()
                .residue_mass(MassMode::Monoisotopic)
        })
        .sum::<f64>()
        + water
}

/// Digest every database entry once, accumulating the MOWSE histogram, then search every
/// entry against a spectrum made from the second protein's tryptic fragments.
fn search_all(db: &SequenceDatabase) -> Vec<MatchResult> {
    let registry = EnzymeRegistry::built_in();
    let trypsin = registry.get("trypsin").unwrap();
    let params = DigestParameters::new(0);
    let engine = PeakMatchEngine::new(MassMode::Monoisotopic);

    // Phase one: the histogram sees the entire database before any scoring
    let mut accumulator = MowseAccumulator::new();
    for entry in db.sequences() {
        let (_, protein) = entry.unwrap();
        for fragment in digest(&protein, trypsin, &params).unwrap() {
            accumulator.accumulate(fragment.mass(MassMode::Monoisotopic), protein_mass(&protein));
        }
    }
    let table = accumulator.freeze();

    // The observed spectrum: the first two tryptic fragments of protein two, singly charged
    let target = db.sequence(1).unwrap();
    let observed: Vec<Peak> = digest(&target, trypsin, &params)
        .unwrap()
        .iter()
        .take(2)
        .map(|fragment| Peak::new(fragment.mass(MassMode::Monoisotopic) + PROTON_MASS, 50.0, 1))
        .collect();

    // Phase two: score every entry, each with its own private peak set
    let limits = SearchLimits::unlimited();
    let mut results = Vec::new();
    for entry in db.sequences() {
        let (serial, protein) = entry.unwrap();
        let fragments = digest(&protein, trypsin, &params).unwrap();
        let mut peaks = PeakSet::new(observed.clone(), Tolerance::Absolute(0.01));
        results.push(engine.match_fragments_mowse(
            &fragments,
            &mut peaks,
            &table,
            protein_mass(&protein),
        ));
        assert_eq!(limits.check(serial + 1, db.entry_count()), SearchProgress::Continue);
    }
    results
}

#[test]
fn index_round_trip_matches_direct_parsing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("proteins.fasta");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(FASTA.as_bytes())
        .unwrap();

    let db = SequenceDatabase::open(&path, true).unwrap();
    assert_eq!(db.entry_count(), 3);

    // Parse the same text directly and compare entry by entry
    let direct: Vec<(String, String)> = FASTA
        .split('>')
        .filter(|record| !record.is_empty())
        .map(|record| {
            let (comment, sequence) = record.split_once('\n').unwrap();
            (comment.to_string(), sequence.replace('\n', ""))
        })
        .collect();
    for (serial, (comment, sequence)) in direct.iter().enumerate() {
        assert_eq!(&db.comment(serial as u32).unwrap(), comment);
        assert_eq!(&db.sequence(serial as u32).unwrap(), sequence);
    }
}

#[test]
fn the_spectrum_source_scores_highest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("proteins.fasta");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(FASTA.as_bytes())
        .unwrap();
    let db = SequenceDatabase::open(&path, true).unwrap();

    let results = search_all(&db);
    assert_eq!(results.len(), 3);
    // Protein two explains both peaks
    assert_eq!(results[1].matched_peaks, 2);
    assert!(results[1].score > results[0].score);
    assert!(results[1].score > results[2].score);
    // Nobody used a peak twice
    for result in &results {
        assert!(result.matched_peaks <= result.total_peaks);
    }
}

#[test]
fn reruns_are_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("proteins.fasta");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(FASTA.as_bytes())
        .unwrap();
    let db = SequenceDatabase::open(&path, true).unwrap();

    assert_eq!(search_all(&db), search_all(&db));
}
