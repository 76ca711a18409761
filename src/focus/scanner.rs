use crate::dom::{Document, NodeId};

/// Interactive, currently rendered descendants of `container` in document
/// order. Tab-index values do not reorder the result.
pub fn scan(doc: &Document, container: NodeId) -> Vec<NodeId> {
    doc.descendants(container)
        .into_iter()
        .filter(|id| doc.node(*id).is_some_and(|n| n.is_interactive()))
        .filter(|id| doc.is_rendered(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::markup::parse_into;

    fn container(markup: &str) -> (Document, NodeId) {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.append_child(doc.body(), div).unwrap();
        parse_into(&mut doc, div, markup).unwrap();
        (doc, div)
    }

    #[test]
    fn test_empty_container() {
        let (doc, div) = container("");
        assert!(scan(&doc, div).is_empty());
    }

    #[test]
    fn test_document_order_ignores_tab_index_values() {
        let (doc, div) = container(
            r##"<div tabindex="5">a</div><button>b</button><a href="#">c</a><span tabindex="1">d</span>"##,
        );
        let texts: Vec<String> = scan(&doc, div)
            .into_iter()
            .map(|n| doc.text_content(n))
            .collect();
        assert_eq!(texts, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_filters_non_interactive_and_disabled() {
        let (doc, div) = container(
            r#"<p>text</p><a>no href</a><input type="hidden" name="h"><button disabled>x</button>
               <input name="ok"><div tabindex="-1">skip</div><iframe></iframe>"#,
        );
        let found = scan(&doc, div);
        assert_eq!(found.len(), 2);
        assert_eq!(doc.form_field(div, "ok"), Some(found[0]));
        assert!(doc.node(found[1]).unwrap().is_tag("iframe"));
    }

    #[test]
    fn test_hidden_elements_are_skipped() {
        let (mut doc, div) = container(r#"<button>a</button><section><button>b</button></section>"#);
        let section = doc.descendants(div)[2];
        assert!(doc.node(section).unwrap().is_tag("section"));
        doc.set_hidden(section, true).unwrap();
        assert_eq!(scan(&doc, div).len(), 1);
    }

    #[test]
    fn test_zero_size_with_layout_box_is_visible() {
        let (mut doc, div) = container("<button>a</button>");
        let button = scan(&doc, div)[0];
        doc.set_size(button, 0, 0).unwrap();
        assert_eq!(scan(&doc, div), vec![button]);
    }
}
