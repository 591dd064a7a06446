use crate::core::io::traits::StructureFile;
use crate::core::models::ids::{ResidueIdentifier, StructureIdentifier};
use crate::core::models::residue::{Residue, ResidueType};
use crate::core::models::structure::{Revision, Structure};
use crate::core::utils::geometry;
use crate::core::utils::identifiers::{BACKBONE_REPRESENTATIVE_ATOM, is_side_chain_heavy_atom};
use nalgebra::Point3;
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM record (must be at least 54 chars)")]
    LineTooShort,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn parse_int(line: &str, line_num: usize, start: usize, end: usize) -> Result<isize, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

#[derive(Debug)]
struct PendingResidue {
    identifier: ResidueIdentifier,
    residue_type: ResidueType,
    backbone: Option<Point3<f64>>,
    side_chain_atoms: Vec<Point3<f64>>,
}

impl PendingResidue {
    fn finish(self) -> Option<Residue> {
        let backbone = self.backbone?;
        Some(Residue::new(
            self.identifier,
            self.residue_type,
            backbone,
            geometry::centroid(&self.side_chain_atoms),
        ))
    }
}

/// Reader for the fixed-column PDB format.
///
/// Only `ATOM` records of the first model contribute; residues without an alpha
/// carbon or with a non-standard name are skipped, so a file without polymer
/// residues yields an empty [`Structure`].
pub struct PdbFile;

impl StructureFile for PdbFile {
    type Error = PdbError;

    fn read_from(
        reader: &mut impl BufRead,
        identifier: StructureIdentifier,
    ) -> Result<Structure, Self::Error> {
        let mut residues = Vec::new();
        let mut pending: Option<PendingResidue> = None;
        let mut latest_modification: Option<u32> = None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            match slice_and_trim(&line, 0, 6) {
                "ATOM" => {
                    if line.len() < 54 {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::LineTooShort,
                        });
                    }

                    let alt_loc = slice_and_trim(&line, 16, 17);
                    if !(alt_loc.is_empty() || alt_loc == "A") {
                        continue;
                    }

                    let atom_name = slice_and_trim(&line, 12, 16);
                    if atom_name.is_empty() {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::MissingRequiredField {
                                columns: "13-16".into(),
                            },
                        });
                    }
                    let Some(residue_type) =
                        ResidueType::from_three_letter(slice_and_trim(&line, 17, 20))
                    else {
                        continue;
                    };
                    let chain_id = slice_and_trim(&line, 21, 22).chars().next().unwrap_or(' ');
                    let seq_id = parse_int(&line, line_num, 22, 26)?;
                    let insertion_code = slice_and_trim(&line, 26, 27).chars().next();
                    let position = Point3::new(
                        parse_float(&line, line_num, 30, 38)?,
                        parse_float(&line, line_num, 38, 46)?,
                        parse_float(&line, line_num, 46, 54)?,
                    );
                    let element = line.get(76..78);

                    let residue_identifier = ResidueIdentifier {
                        chain_id,
                        seq_id,
                        insertion_code,
                    };
                    if pending.as_ref().map(|p| p.identifier) != Some(residue_identifier) {
                        if let Some(residue) = pending.take().and_then(PendingResidue::finish) {
                            residues.push(residue);
                        }
                        pending = Some(PendingResidue {
                            identifier: residue_identifier,
                            residue_type,
                            backbone: None,
                            side_chain_atoms: Vec::new(),
                        });
                    }

                    if let Some(current) = pending.as_mut() {
                        if atom_name == BACKBONE_REPRESENTATIVE_ATOM {
                            current.backbone.get_or_insert(position);
                        } else if is_side_chain_heavy_atom(atom_name, element) {
                            current.side_chain_atoms.push(position);
                        }
                    }
                }
                "REVDAT" => {
                    let modification = parse_int(&line, line_num, 7, 10)?;
                    let modification = u32::try_from(modification).unwrap_or(0);
                    latest_modification =
                        Some(latest_modification.map_or(modification, |m| m.max(modification)));
                }
                "ENDMDL" | "END" => break,
                _ => {}
            }
        }

        if let Some(residue) = pending.take().and_then(PendingResidue::finish) {
            residues.push(residue);
        }

        let revision = latest_modification
            .map(|major| Revision::new(major, 0))
            .unwrap_or_default();
        Ok(Structure::new(identifier, revision, residues))
    }
}
