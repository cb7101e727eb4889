//! Exclusive canonicalization of one subtree, in the context of its document.
//!
//! `bergshamra-c14n` canonicalizes whole documents. A subtree is cut out
//! of the source text with the namespace bindings it inherits redeclared on
//! its start tag, so exclusive C14N sees the same in-scope namespaces it
//! would see in place. An excluded descendant (the enveloped signature) is
//! removed from the text before canonicalization.

use bergshamra_c14n::C14nMode;

use crate::error::{SamlError, SamlResult};

use super::document::{NodeId, XmlDocument};

/// Canonicalization parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct C14nOptions<'a> {
    /// Keep comment nodes (`#WithComments`).
    pub with_comments: bool,
    /// `InclusiveNamespaces` prefix list; `#default` names the default namespace.
    pub inclusive_prefixes: &'a [String],
    /// A descendant to leave out, such as an enveloped signature.
    pub exclude: Option<NodeId>,
}

/// Canonicalizes the subtree rooted at `node` with Exclusive XML C14N 1.0.
///
/// # Errors
///
/// Returns [`SamlError::XmlParse`] if `node` is not an element, `exclude`
/// is not one of its descendants, or the canonicalizer rejects the text.
pub fn canonicalize(
    doc: &XmlDocument,
    node: NodeId,
    options: &C14nOptions<'_>,
) -> SamlResult<Vec<u8>> {
    let text = subtree_in_context(doc, node, options.exclude)?;
    let mode = if options.with_comments {
        C14nMode::ExclusiveWithComments
    } else {
        C14nMode::Exclusive
    };

    bergshamra_c14n::canonicalize(&text, mode, None, options.inclusive_prefixes)
        .map_err(|e| SamlError::XmlParse(format!("canonicalization failed: {e}")))
}

fn subtree_in_context(
    doc: &XmlDocument,
    node: NodeId,
    exclude: Option<NodeId>,
) -> SamlResult<String> {
    let element = doc
        .element(node)
        .ok_or_else(|| SamlError::XmlParse("only elements can be canonicalized".to_string()))?;
    let source = doc.source();
    let name_end = element.span.start + 1 + element.qualified_name().len();

    let skip = match exclude {
        Some(excluded) => {
            let span = doc
                .element(excluded)
                .map(|el| el.span.clone())
                .filter(|span| span.start >= element.content_start && span.end <= element.span.end)
                .ok_or_else(|| {
                    SamlError::XmlParse("excluded node is not inside the subtree".to_string())
                })?;
            Some(span)
        }
        None => None,
    };

    let mut text = String::with_capacity(element.span.len() + 512);
    text.push_str(&source[element.span.start..name_end]);
    for (prefix, uri) in doc.in_scope_namespaces(node) {
        if element.namespace_decls.iter().any(|(declared, _)| *declared == prefix) {
            continue;
        }
        let uri = quick_xml::escape::escape(uri.as_str());
        if prefix.is_empty() {
            text.push_str(&format!(" xmlns=\"{uri}\""));
        } else {
            text.push_str(&format!(" xmlns:{prefix}=\"{uri}\""));
        }
    }
    match skip {
        Some(span) => {
            text.push_str(&source[name_end..span.start]);
            text.push_str(&source[span.end..element.span.end]);
        }
        None => text.push_str(&source[name_end..element.span.end]),
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c14n(doc: &XmlDocument, node: NodeId, options: &C14nOptions<'_>) -> String {
        String::from_utf8(canonicalize(doc, node, options).unwrap()).unwrap()
    }

    #[test]
    fn subtree_keeps_inherited_namespaces_it_uses() {
        let doc = XmlDocument::parse(
            r#"<p:r xmlns:p="urn:p" xmlns:a="urn:a" xmlns:unused="urn:u"><p:c a:x="1" y="2"/></p:r>"#,
        )
        .unwrap();
        let child = doc.child_elements(doc.root()).next().unwrap();
        assert_eq!(
            c14n(&doc, child, &C14nOptions::default()),
            r#"<p:c xmlns:a="urn:a" xmlns:p="urn:p" y="2" a:x="1"></p:c>"#
        );
    }

    #[test]
    fn inclusive_prefixes_pull_in_ancestor_declarations() {
        let doc = XmlDocument::parse(
            r#"<r xmlns:xs="urn:xs" xmlns:xsi="urn:xsi"><c xsi:type="xs:string">v</c></r>"#,
        )
        .unwrap();
        let child = doc.child_elements(doc.root()).next().unwrap();

        assert_eq!(
            c14n(&doc, child, &C14nOptions::default()),
            r#"<c xmlns:xsi="urn:xsi" xsi:type="xs:string">v</c>"#
        );

        let prefixes = vec!["xs".to_string()];
        let options = C14nOptions {
            inclusive_prefixes: &prefixes,
            ..C14nOptions::default()
        };
        assert_eq!(
            c14n(&doc, child, &options),
            r#"<c xmlns:xs="urn:xs" xmlns:xsi="urn:xsi" xsi:type="xs:string">v</c>"#
        );
    }

    #[test]
    fn inherited_default_namespace_is_rendered() {
        let doc = XmlDocument::parse(r#"<r xmlns="urn:d"><c a="1"/></r>"#).unwrap();
        let child = doc.child_elements(doc.root()).next().unwrap();
        assert_eq!(
            c14n(&doc, child, &C14nOptions::default()),
            r#"<c xmlns="urn:d" a="1"></c>"#
        );
    }

    #[test]
    fn excluded_descendant_is_omitted() {
        let doc = XmlDocument::parse("<r><a>1</a><s><t/></s><b>2</b></r>").unwrap();
        let sig = doc.child_elements(doc.root()).nth(1).unwrap();
        let options = C14nOptions {
            exclude: Some(sig),
            ..C14nOptions::default()
        };
        assert_eq!(c14n(&doc, doc.root(), &options), "<r><a>1</a><b>2</b></r>");
    }

    #[test]
    fn exclusion_must_lie_inside_the_subtree() {
        let doc = XmlDocument::parse("<r><a/><b/></r>").unwrap();
        let mut children = doc.child_elements(doc.root());
        let a = children.next().unwrap();
        let b = children.next().unwrap();
        let options = C14nOptions {
            exclude: Some(b),
            ..C14nOptions::default()
        };
        assert!(matches!(
            canonicalize(&doc, a, &options).unwrap_err(),
            SamlError::XmlParse(_)
        ));
    }

    #[test]
    fn comments_only_with_comments() {
        let doc = XmlDocument::parse("<r><!-- hi -->x</r>").unwrap();
        assert_eq!(c14n(&doc, doc.root(), &C14nOptions::default()), "<r>x</r>");

        let options = C14nOptions {
            with_comments: true,
            ..C14nOptions::default()
        };
        assert_eq!(c14n(&doc, doc.root(), &options), "<r><!-- hi -->x</r>");
    }
}
