//! The type policy: which declared media types may be stored at all.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::media::bare_type;

/// Bare MIME types accepted when no custom allow-list is configured.
///
/// The registered `text/*` types plus `application/json`.
pub const DEFAULT_SUPPORTED_TYPES: &[&str] = &[
    "text/1d-interleaved-parityfec",
    "text/cache-manifest",
    "text/calendar",
    "text/cql",
    "text/cql-expression",
    "text/cql-identifier",
    "text/css",
    "text/csv",
    "text/csv-schema",
    "text/directory",
    "text/dns",
    "text/ecmascript",
    "text/encaprtp",
    "text/enriched",
    "text/example",
    "text/fhirpath",
    "text/flexfec",
    "text/fwdred",
    "text/gff3",
    "text/grammar-ref-list",
    "text/hl7v2",
    "text/html",
    "text/javascript",
    "text/jcr-cnd",
    "text/markdown",
    "text/mizar",
    "text/n3",
    "text/parameters",
    "text/parityfec",
    "text/plain",
    "text/provenance-notation",
    "text/prs.fallenstein.rst",
    "text/prs.lines.tag",
    "text/prs.prop.logic",
    "text/prs.texi",
    "text/raptorfec",
    "text/RED",
    "text/rfc822-headers",
    "text/richtext",
    "text/rtf",
    "text/rtp-enc-aescm128",
    "text/rtploopback",
    "text/rtx",
    "text/SGML",
    "text/shaclc",
    "text/shex",
    "text/spdx",
    "text/strings",
    "text/t140",
    "text/tab-separated-values",
    "text/troff",
    "text/turtle",
    "text/ulpfec",
    "text/uri-list",
    "text/vcard",
    "text/vnd.a",
    "text/vnd.abc",
    "text/vnd.ascii-art",
    "text/vnd.curl",
    "text/vnd.debian.copyright",
    "text/vnd.DMClientScript",
    "text/vnd.dvb.subtitle",
    "text/vnd.esmertec.theme-descriptor",
    "text/vnd.exchangeable",
    "text/vnd.familysearch.gedcom",
    "text/vnd.ficlab.flt",
    "text/vnd.fly",
    "text/vnd.fmi.flexstor",
    "text/vnd.gml",
    "text/vnd.graphviz",
    "text/vnd.hans",
    "text/vnd.hgl",
    "text/vnd.in3d.3dml",
    "text/vnd.in3d.spot",
    "text/vnd.IPTC.NewsML",
    "text/vnd.IPTC.NITF",
    "text/vnd.latex-z",
    "text/vnd.motorola.reflex",
    "text/vnd.ms-mediapackage",
    "text/vnd.net2phone.commcenter.command",
    "text/vnd.radisys.msml-basic-layout",
    "text/vnd.senx.warpscript",
    "text/vnd.si.uricatalogue",
    "text/vnd.sun.j2me.app-descriptor",
    "text/vnd.sosi",
    "text/vnd.trolltech.linguist",
    "text/vnd.vcf",
    "text/vnd.wap.si",
    "text/vnd.wap.sl",
    "text/vnd.wap.wml",
    "text/vnd.wap.wmlscript",
    "text/vnd.zoo.kcl",
    "text/vtt",
    "text/wgsl",
    "text/xml",
    "text/xml-external-parsed-entity",
    "application/json",
];

/// Closed allow-list of storable bare MIME types.
///
/// Membership is checked on the bare type (parameters stripped),
/// case-insensitively. The policy is consulted when a fragment is written;
/// stored fragments are never re-validated on read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TypePolicy {
    allowed: BTreeSet<String>,
}

impl TypePolicy {
    /// Build a policy from an explicit list of types.
    ///
    /// Parameters on the listed entries are ignored.
    pub fn from_types<S: AsRef<str>>(types: impl IntoIterator<Item = S>) -> Self {
        let allowed = types
            .into_iter()
            .map(|t| bare_type(t.as_ref()).to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { allowed }
    }

    /// Whether a declared media type (parameters allowed) may be stored.
    pub fn is_supported(&self, declared: &str) -> bool {
        let bare = bare_type(declared).to_ascii_lowercase();
        self.allowed.contains(&bare)
    }

    /// The allowed bare types, lowercase and sorted.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

impl Default for TypePolicy {
    fn default() -> Self {
        Self::from_types(DEFAULT_SUPPORTED_TYPES)
    }
}

impl From<Vec<String>> for TypePolicy {
    fn from(types: Vec<String>) -> Self {
        Self::from_types(types)
    }
}

impl From<TypePolicy> for Vec<String> {
    fn from(policy: TypePolicy) -> Self {
        policy.allowed.into_iter().collect()
    }
}
