//! Nucleotide sequence functions.
//!
//! Sequences are upper-case strings over `ACGT` (DNA) or `ACGU` (RNA). Any other character is
//! rejected with [Error::InvalidInput].
use crate::{types::*, value::Value};

fn sequence(args: &[Value]) -> Result<&str> {
    args.first()
        .ok_or_else(|| Error::invalid_input("missing sequence argument"))?
        .as_text()
}

fn invalid_char(c: char) -> Error {
    Error::invalid_input(format!("invalid character in sequence: {}", c))
}

/// Map every base through `f`, failing on the first base that `f` rejects.
fn map_bases(seq: &str, f: impl Fn(char) -> Option<char>) -> Result<String> {
    seq.chars().map(|c| f(c).ok_or_else(|| invalid_char(c))).collect()
}

fn complement_base(c: char) -> Option<char> {
    match c {
        'A' => Some('T'),
        'T' => Some('A'),
        'C' => Some('G'),
        'G' => Some('C'),
        _ => None,
    }
}

/// Fraction of bases that are `G` or `C`. The empty sequence has a GC content of 0.
pub fn gc_content(args: &[Value]) -> Result<Value> {
    let seq = sequence(args)?;
    if seq.is_empty() {
        return Ok(Value::Float(0.0));
    }
    let gc = seq.chars().filter(|c| matches!(c, 'G' | 'C')).count();
    Ok(Value::Float(gc as f64 / seq.chars().count() as f64))
}

pub fn complement(args: &[Value]) -> Result<Value> {
    map_bases(sequence(args)?, complement_base).map(Value::from)
}

pub fn reverse_complement(args: &[Value]) -> Result<Value> {
    let ret = map_bases(sequence(args)?, complement_base)?;
    Ok(Value::from(ret.chars().rev().collect::<String>()))
}

/// DNA to RNA: `T` becomes `U`.
pub fn transcribe(args: &[Value]) -> Result<Value> {
    map_bases(sequence(args)?, |c| match c {
        'T' => Some('U'),
        'A' | 'C' | 'G' => Some(c),
        _ => None,
    })
    .map(Value::from)
}

/// RNA to DNA: `U` becomes `T`.
pub fn reverse_transcribe(args: &[Value]) -> Result<Value> {
    map_bases(sequence(args)?, |c| match c {
        'U' => Some('T'),
        'A' | 'C' | 'G' => Some(c),
        _ => None,
    })
    .map(Value::from)
}

/// The standard DNA codon table. Stop codons translate to `*`.
fn codon(c: &[u8]) -> Option<char> {
    Some(match c {
        b"AAA" | b"AAG" => 'K',
        b"AAT" | b"AAC" => 'N',
        b"ATA" | b"ATT" | b"ATC" => 'I',
        b"ATG" => 'M',
        b"ACA" | b"ACT" | b"ACC" | b"ACG" => 'T',
        b"AGA" | b"AGG" | b"CGA" | b"CGT" | b"CGC" | b"CGG" => 'R',
        b"AGT" | b"AGC" | b"TCA" | b"TCT" | b"TCC" | b"TCG" => 'S',
        b"TAA" | b"TAG" | b"TGA" => '*',
        b"TAT" | b"TAC" => 'Y',
        b"TTA" | b"TTG" | b"CTA" | b"CTT" | b"CTC" | b"CTG" => 'L',
        b"TTT" | b"TTC" => 'F',
        b"TGT" | b"TGC" => 'C',
        b"TGG" => 'W',
        b"CAA" | b"CAG" => 'Q',
        b"CAT" | b"CAC" => 'H',
        b"CCA" | b"CCT" | b"CCC" | b"CCG" => 'P',
        b"GAA" | b"GAG" => 'E',
        b"GAT" | b"GAC" => 'D',
        b"GTA" | b"GTT" | b"GTC" | b"GTG" => 'V',
        b"GCA" | b"GCT" | b"GCC" | b"GCG" => 'A',
        b"GGA" | b"GGT" | b"GGC" | b"GGG" => 'G',
        _ => return None,
    })
}

/// Translate a DNA sequence into its amino acid sequence, one letter per codon.
pub fn translate_dna_to_aa(args: &[Value]) -> Result<Value> {
    let seq = sequence(args)?;
    if seq.len() % 3 != 0 {
        return Err(Error::invalid_input(format!(
            "invalid sequence length: {}",
            seq.len()
        )));
    }
    seq.as_bytes()
        .chunks(3)
        .map(|c| {
            codon(c).ok_or_else(|| {
                Error::invalid_input(format!("invalid codon: {}", String::from_utf8_lossy(c)))
            })
        })
        .collect::<Result<String>>()
        .map(Value::from)
}

pub(super) fn resolve(symbol: &str) -> Option<fn(&[Value]) -> Result<Value>> {
    Some(match symbol {
        "gc_content" => gc_content,
        "complement" => complement,
        "reverse_complement" => reverse_complement,
        "transcribe" => transcribe,
        "reverse_transcribe" => reverse_transcribe,
        "translate_dna_to_aa" => translate_dna_to_aa,
        _ => return None,
    })
}
