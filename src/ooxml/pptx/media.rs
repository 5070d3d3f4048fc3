//! Media shared between slides.
//!
//! Slides reference images, audio and video through their own relationship
//! tables. A cloned slide gets fresh relationship ids bound to the same
//! media parts. [`MediaPool`] makes that sharing observable: it maps each
//! `(slide, rId)` pair to a pool entry keyed by the SHA-256 of the target
//! part's bytes.

use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::pptx::presentation::Presentation;
use crate::ooxml::pptx::slide::SlideKey;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Write as FmtWrite;

const MEDIA_RELTYPES: &[&str] = &[rt::IMAGE, rt::MEDIA, rt::AUDIO, rt::VIDEO];

/// One distinct piece of media content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    /// Part holding the bytes (the first one seen, if several are identical)
    pub partname: PackURI,
    pub content_type: String,
    pub digest: [u8; 32],
    pub size: usize,
}

impl MediaEntry {
    /// Lowercase hex of the content digest.
    pub fn digest_hex(&self) -> String {
        let mut hex = String::with_capacity(64);
        for byte in &self.digest {
            let _ = write!(hex, "{:02x}", byte);
        }
        hex
    }
}

/// Content-addressed view of the media a deck's slides reference.
#[derive(Debug, Clone, Default)]
pub struct MediaPool {
    entries: Vec<MediaEntry>,
    by_digest: HashMap<[u8; 32], usize>,
    refs: HashMap<(SlideKey, String), usize>,
}

impl MediaPool {
    /// Collect the internal media relationships of every slide in deck
    /// order. Relationships whose target part is missing are skipped.
    pub fn from_presentation(pres: &Presentation) -> Result<Self> {
        let mut pool = Self::default();
        for slide in pres.slides() {
            for rel in pres.slide_rels(slide.key())?.sorted() {
                if rel.is_external() || !MEDIA_RELTYPES.contains(&rel.reltype()) {
                    continue;
                }
                let partname = rel.target_partname()?;
                let Some(part) = pres.package().part(&partname) else {
                    tracing::warn!(slide = %slide.key(), part = %partname, "media part missing");
                    continue;
                };

                let mut digest = [0u8; 32];
                digest.copy_from_slice(&Sha256::digest(part.blob()));
                let index = *pool.by_digest.entry(digest).or_insert_with(|| {
                    pool.entries.push(MediaEntry {
                        partname: partname.clone(),
                        content_type: part.content_type().to_string(),
                        digest,
                        size: part.blob().len(),
                    });
                    pool.entries.len() - 1
                });
                pool.refs.insert((slide.key(), rel.r_id().to_string()), index);
            }
        }
        Ok(pool)
    }

    /// Number of distinct media contents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MediaEntry] {
        &self.entries
    }

    /// Pool entry a slide's relationship resolves to.
    pub fn entry_for(&self, slide: SlideKey, r_id: &str) -> Option<&MediaEntry> {
        self.refs
            .get(&(slide, r_id.to_string()))
            .map(|&i| &self.entries[i])
    }

    /// `(rId, entry)` pairs of one slide, ordered by rId.
    pub fn references(&self, slide: SlideKey) -> Vec<(&str, &MediaEntry)> {
        let mut refs: Vec<(&str, &MediaEntry)> = self
            .refs
            .iter()
            .filter(|((key, _), _)| *key == slide)
            .map(|((_, r_id), &i)| (r_id.as_str(), &self.entries[i]))
            .collect();
        refs.sort_by(|a, b| a.0.cmp(b.0));
        refs
    }
}
