//! Binder tests: object and node associations kept in both directions.

#[cfg(test)]
mod tests {
    use xbind_binding::{Document, QName, Value, XmlBind};

    use crate::model::{Group, Person};
    use crate::model_context;

    const GROUP: &str = concat!(
        r#"<group xmlns="urn:example">"#,
        "<members><name>Ann</name><age>30</age></members>",
        "<members><name>Bob</name><age>41</age></members>",
        "</group>"
    );

    #[test]
    fn test_should_move_binding_to_latest_node() {
        let context = model_context().expect("context");
        let mut binder = context.binder();
        let mut doc = Document::new();
        let a = doc.create_element(QName::local("a"));
        let b = doc.create_element(QName::local("b"));
        let person = Person::new("Ann", 30).to_value();

        binder.bind(&person, a).expect("bind a");
        binder.bind(&person, b).expect("bind b");
        assert_eq!(binder.get_node(&person), Some(b));
        assert_eq!(binder.get_object(a), None);
        assert_eq!(binder.get_object(b), person.identity());
        assert_eq!(binder.table().len(), 1);
    }

    #[test]
    fn test_should_refuse_to_bind_simple_values() {
        let context = model_context().expect("context");
        let mut binder = context.binder();
        let mut doc = Document::new();
        let node = doc.create_element(QName::local("n"));
        assert!(binder.bind(&Value::Int(1), node).is_err());
        assert!(binder.table().is_empty());
    }

    #[test]
    fn test_should_bind_every_object_when_marshalling() {
        let context = model_context().expect("context");
        let mut binder = context.binder();
        let mut doc = Document::new();
        let root = doc.root();
        let group = Group {
            members: vec![Person::new("Ann", 30), Person::new("Bob", 41)],
        }
        .to_value();

        let node = binder.marshal(&group, &mut doc, root).expect("marshal");
        assert_eq!(doc.document_element(), Some(node));
        assert_eq!(binder.get_node(&group), Some(node));
        assert_eq!(binder.table().len(), 3);

        let Value::Object(object) = &group else {
            panic!("group lowers to an object");
        };
        let Some(Value::List(members)) = object.get("members") else {
            panic!("members lowers to a list");
        };
        let second = doc.child_elements(node).nth(1).expect("second member");
        assert_eq!(binder.get_node(&members[1]), Some(second));
        assert_eq!(binder.get_object(second), members[1].identity());
    }

    #[test]
    fn test_should_bind_every_object_when_unmarshalling() {
        let context = model_context().expect("context");
        let mut binder = context.binder();
        let doc = Document::parse(GROUP.as_bytes()).expect("parse");
        let node = doc.document_element().expect("document element");

        let value = binder.unmarshal(&doc, node).expect("unmarshal");
        assert_eq!(binder.get_node(&value), Some(node));
        assert_eq!(binder.table().len(), 3);
        let first = doc.first_element_child(node).expect("first member");
        assert!(binder.get_object(first).is_some());

        let group = Group::from_value(value).expect("group");
        assert_eq!(group.members[1], Person::new("Bob", 41));
    }

    #[test]
    fn test_should_update_xml_in_place() {
        let context = model_context().expect("context");
        let mut binder = context.binder();
        let mut doc = Document::new();
        let root = doc.root();
        let mut value = Person::new("Ann", 30).to_value();
        let node = binder.marshal(&value, &mut doc, root).expect("marshal");

        if let Value::Object(object) = &mut value {
            object.set("age", Value::Int(31));
        }
        let updated = binder.update_xml(&value, &mut doc).expect("update xml");
        assert_eq!(updated, node);
        assert_eq!(binder.get_node(&value), Some(node));
        assert_eq!(doc.child_elements(node).count(), 2);

        let xml = doc.node_to_xml(node).expect("serialize");
        assert!(xml.contains("<age>31</age>"), "{xml}");
        assert!(!xml.contains("30"), "{xml}");
    }

    #[test]
    fn test_should_fail_to_update_unbound_object() {
        let context = model_context().expect("context");
        let mut binder = context.binder();
        let mut doc = Document::new();
        let err = binder
            .update_xml(&Person::new("Ann", 30).to_value(), &mut doc)
            .expect_err("unbound");
        assert!(err.to_string().contains("not bound"), "{err}");
    }

    #[test]
    fn test_should_update_object_keeping_identity() {
        let context = model_context().expect("context");
        let mut binder = context.binder();
        let mut doc = Document::parse(
            r#"<person xmlns="urn:example"><name>Ann</name><age>30</age></person>"#.as_bytes(),
        )
        .expect("parse");
        let node = doc.document_element().expect("document element");
        let value = binder.unmarshal(&doc, node).expect("unmarshal");
        let identity = value.identity();

        let age = doc.child_elements(node).nth(1).expect("age element");
        doc.clear_element(age);
        let text = doc.create_text("45");
        doc.append_child(age, text);

        let updated = binder
            .update_object(&doc, node, value)
            .expect("update object");
        assert_eq!(updated.identity(), identity);
        assert_eq!(binder.get_object(node), identity);
        assert_eq!(
            Person::from_value(updated).expect("person"),
            Person::new("Ann", 45)
        );
    }

    #[test]
    fn test_should_invalidate_subtree() {
        let context = model_context().expect("context");
        let mut binder = context.binder();
        let doc = Document::parse(GROUP.as_bytes()).expect("parse");
        let node = doc.document_element().expect("document element");
        binder.unmarshal(&doc, node).expect("unmarshal");
        assert_eq!(binder.table().len(), 3);

        let first = doc.first_element_child(node).expect("first member");
        binder.invalidate(&doc, first);
        assert_eq!(binder.table().len(), 2);
        assert_eq!(binder.get_object(first), None);

        binder.invalidate(&doc, node);
        assert!(binder.table().is_empty());
    }
}
