/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

/// Capabilities learned from the FEAT reply.
///
/// All fields default to false, which is also what a server that rejects
/// FEAT altogether gets.
#[derive(Debug, Default)]
pub(crate) struct FtpServerFeature {
    support_utf8: bool,
    support_mlst: bool,
    support_size: bool,
    support_mdtm: bool,
    support_rest_stream: bool,
    support_epsv: bool,
    support_pret: bool,
}

impl FtpServerFeature {
    /// Register one feature line, name already trimmed of its leading space.
    pub(crate) fn parse_and_set(&mut self, line: &str) {
        let name = match line.split_once(' ') {
            Some((name, _params)) => name,
            None => line,
        };
        match name.to_uppercase().as_str() {
            "UTF8" => self.support_utf8 = true,
            "MLST" | "MLSD" => self.support_mlst = true,
            "SIZE" => self.support_size = true,
            "MDTM" => self.support_mdtm = true,
            "REST" => {
                // "REST STREAM" is the only variant we can make use of
                if line.to_uppercase().contains("STREAM") {
                    self.support_rest_stream = true;
                }
            }
            "EPSV" => self.support_epsv = true,
            "PRET" => self.support_pret = true,
            _ => {}
        }
    }

    #[inline]
    pub(crate) fn support_utf8(&self) -> bool {
        self.support_utf8
    }

    #[inline]
    pub(crate) fn support_mlst(&self) -> bool {
        self.support_mlst
    }

    #[inline]
    pub(crate) fn support_size(&self) -> bool {
        self.support_size
    }

    #[inline]
    pub(crate) fn support_mdtm(&self) -> bool {
        self.support_mdtm
    }

    #[inline]
    pub(crate) fn support_rest_stream(&self) -> bool {
        self.support_rest_stream
    }

    #[inline]
    pub(crate) fn support_epsv(&self) -> bool {
        self.support_epsv
    }

    #[inline]
    pub(crate) fn support_pret(&self) -> bool {
        self.support_pret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_feature_lines() {
        let mut feature = FtpServerFeature::default();
        for line in ["UTF8", "MLST type*;size*;modify*;", "REST STREAM", "PRET"] {
            feature.parse_and_set(line);
        }
        assert!(feature.support_utf8());
        assert!(feature.support_mlst());
        assert!(feature.support_rest_stream());
        assert!(feature.support_pret());
        assert!(!feature.support_size());
    }

    #[test]
    fn rest_without_stream() {
        let mut feature = FtpServerFeature::default();
        feature.parse_and_set("REST");
        assert!(!feature.support_rest_stream());
    }
}
