// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 YamlBind, Schema-Directed YAML Marshalling for Rust. All rights reserved.

use crate::{
    libyaml::{
        error::Mark,
        parser::{Event as YamlEvent, Parser},
    },
    modules::{
        error::{self, ErrorKind, Result},
        path::Path,
    },
};
use std::{borrow::Cow, collections::BTreeMap};

/// Buffers the events of one YAML document and resolves its anchors.
///
/// The engines walk a [`Document`] rather than the live parser: buffering
/// lets an alias replay the anchored node's event subsequence by jumping
/// back to its recorded position, with every event keeping the mark it was
/// originally parsed at.
pub struct Loader<'input> {
    parser: Option<Parser<'input>>,
    document_count: usize,
    record_anchors: bool,
}

/// One parsed document.
#[derive(Debug)]
pub struct Document {
    /// The buffered events with their source positions.
    pub events: Vec<(Event, Mark)>,
    /// Map from alias id to the index of the anchored event.
    pub anchor_event_map: BTreeMap<usize, usize>,
}

/// A document-level event.
///
/// Anchor definitions have already been folded into
/// [`Document::anchor_event_map`]; an `Alias` carries the id of the
/// definition that was current when the alias was parsed, so a later
/// anchor of the same name observably wins only for later aliases.
#[derive(Debug)]
pub enum Event {
    /// Replay the anchored node with the given alias id.
    Alias(usize),
    /// A scalar value.
    Scalar(Box<[u8]>),
    /// Start of a sequence.
    SequenceStart,
    /// End of a sequence.
    SequenceEnd,
    /// Start of a mapping.
    MappingStart,
    /// End of a mapping.
    MappingEnd,
    /// An empty document.
    Void,
}

impl<'input> Loader<'input> {
    /// Creates a loader over the given input.
    ///
    /// When `record_anchors` is false, anchor definitions are not recorded
    /// and any alias in the document fails to resolve.
    pub fn new(input: Cow<'input, [u8]>, record_anchors: bool) -> Self {
        Loader {
            parser: Some(Parser::new(input)),
            document_count: 0,
            record_anchors,
        }
    }

    /// Parses the next document, or returns `None` at the end of the stream.
    pub fn next_document(&mut self) -> Option<Result<Document>> {
        let record_anchors = self.record_anchors;
        let parser = self.parser.as_mut()?;

        let first = self.document_count == 0;
        self.document_count += 1;

        // Anchor name -> id of its latest definition.
        let mut anchors = BTreeMap::new();
        let mut document = Document {
            events: Vec::new(),
            anchor_event_map: BTreeMap::new(),
        };

        loop {
            let (event, mark) = match parser.next_event() {
                Ok(next) => next,
                Err(err) => {
                    self.parser = None;
                    return Some(Err(error::backend(err)));
                }
            };
            let event = match event {
                YamlEvent::StreamStart => continue,
                YamlEvent::StreamEnd => {
                    self.parser = None;
                    return if first {
                        if document.events.is_empty() {
                            document.events.push((Event::Void, mark));
                        }
                        Some(Ok(document))
                    } else {
                        None
                    };
                }
                YamlEvent::DocumentStart => continue,
                YamlEvent::DocumentEnd => return Some(Ok(document)),
                YamlEvent::Alias(alias) => match anchors.get(&alias) {
                    Some(id) => Event::Alias(*id),
                    None => {
                        self.parser = None;
                        return Some(Err(error::fix_mark(
                            error::new(ErrorKind::InvalidAlias),
                            mark,
                            Path::Root,
                        )));
                    }
                },
                YamlEvent::Scalar(mut scalar) => {
                    if let Some(anchor) = scalar.anchor.take() {
                        if record_anchors {
                            let id = document.anchor_event_map.len();
                            anchors.insert(anchor, id);
                            document.anchor_event_map.insert(id, document.events.len());
                        }
                    }
                    Event::Scalar(scalar.value)
                }
                YamlEvent::SequenceStart(mut start) => {
                    if let Some(anchor) = start.anchor.take() {
                        if record_anchors {
                            let id = document.anchor_event_map.len();
                            anchors.insert(anchor, id);
                            document.anchor_event_map.insert(id, document.events.len());
                        }
                    }
                    Event::SequenceStart
                }
                YamlEvent::SequenceEnd => Event::SequenceEnd,
                YamlEvent::MappingStart(mut start) => {
                    if let Some(anchor) = start.anchor.take() {
                        if record_anchors {
                            let id = document.anchor_event_map.len();
                            anchors.insert(anchor, id);
                            document.anchor_event_map.insert(id, document.events.len());
                        }
                    }
                    Event::MappingStart
                }
                YamlEvent::MappingEnd => Event::MappingEnd,
            };
            document.events.push((event, mark));
        }
    }
}
