//! # Features
//!
//! Extensions advertised by the server in its FEAT reply.
//!
//! The scan is a case-sensitive substring search over the whole reply body,
//! per RFC 2389 feature labels are upper-case; lower-case occurrences inside
//! fact lists (such as `MLST size*;modify*`) do not count.

/// Which extensions the server advertised during login. Set once during the
/// handshake and read-only afterwards.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSet {
    /// `MDTM`: modification-time queries.
    pub mdtm: bool,
    /// `SIZE`: file size queries.
    pub size: bool,
    /// `MLST`: machine-readable facts for a single path.
    pub mlst: bool,
    /// `MLSD`: machine-readable directory listings.
    pub mlsd: bool,
    /// `UTF8`: path names are UTF-8 encoded.
    pub utf8: bool,
    /// `MFMT`: modification-time updates.
    pub mfmt: bool,
    /// `EPSV`: extended passive mode.
    pub epsv: bool,
}

impl FeatureSet {
    /// Scan a FEAT reply body for the known feature tokens.
    pub(crate) fn from_feat_text(text: &str) -> Self {
        let features = Self {
            mdtm: text.contains("MDTM"),
            size: text.contains("SIZE"),
            mlst: text.contains("MLST"),
            mlsd: text.contains("MLSD"),
            utf8: text.contains("UTF8"),
            mfmt: text.contains("MFMT"),
            epsv: text.contains("EPSV"),
        };
        debug!("server features: {features:?}");
        features
    }
}
