//! Content shapes: attributes, enums, xml lists, maps, nil, text values and
//! untyped elements.

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet, HashSet};
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use xbind_binding::{
        AnyAttributes, BindError, DynamicElement, HexBinary, QName, TypeKey, Value, XmlBind,
    };

    use crate::model::{Badge, Color, Envelope, Item, Person, Price, Shelf, Sorted};
    use crate::{model_context, to_fragment};

    fn item() -> Item {
        Item {
            sku: "A-1".to_owned(),
            color: Color::Green,
            sizes: vec![1, 2, 3],
            counts: BTreeMap::from([("left".to_owned(), 4), ("right".to_owned(), 5)]),
            note: None,
            checksum: Some(HexBinary(vec![0xCA, 0xFE])),
        }
    }

    #[test]
    fn test_should_marshal_item_content() {
        let context = model_context().expect("context");
        let xml = to_fragment(&context, &item().to_value()).expect("marshal");
        assert!(xml.starts_with(r#"<item sku="A-1">"#), "{xml}");
        assert!(xml.contains("<color>GREEN</color>"), "{xml}");
        assert!(xml.contains("<sizes>1 2 3</sizes>"), "{xml}");
        assert!(
            xml.contains(concat!(
                "<counts>",
                "<entry><key>left</key><value>4</value></entry>",
                "<entry><key>right</key><value>5</value></entry>",
                "</counts>"
            )),
            "{xml}"
        );
        assert!(xml.contains(r#"xsi:nil="true""#), "{xml}");
        assert!(xml.contains("<checksum>CAFE</checksum>"), "{xml}");
    }

    #[test]
    fn test_should_round_trip_item() {
        let context = model_context().expect("context");
        let original = item();
        let xml = to_fragment(&context, &original.to_value()).expect("marshal");
        let back: Item = context
            .unmarshaller()
            .unmarshal(xml.as_bytes())
            .expect("unmarshal");
        assert_eq!(back, original);
    }

    #[test]
    fn test_should_split_xml_list_on_any_whitespace() {
        let context = model_context().expect("context");
        let xml = "<item sku=\"x\"><color>RED</color><sizes>\n  7\t8   9 </sizes></item>";
        let back: Item = context
            .unmarshaller()
            .unmarshal(xml.as_bytes())
            .expect("unmarshal");
        assert_eq!(back.sizes, vec![7, 8, 9]);
        assert!(back.counts.is_empty());
        assert_eq!(back.note, None);
        assert_eq!(back.checksum, None);
    }

    #[test]
    fn test_should_require_declared_attributes() {
        let context = model_context().expect("context");
        let err = context
            .unmarshaller()
            .unmarshal_value("<item><color>RED</color></item>".as_bytes())
            .expect_err("missing sku");
        assert!(matches!(err, BindError::Unmarshal(_)));
        assert!(err.to_string().contains("missing required sku"), "{err}");
    }

    #[test]
    fn test_should_reject_unknown_enum_constant() {
        let context = model_context().expect("context");
        let err = context
            .unmarshaller()
            .unmarshal_value(r#"<item sku="x"><color>PURPLE</color></item>"#.as_bytes())
            .expect_err("unknown constant");
        assert!(matches!(err, BindError::InvalidLexicalValue(_)), "{err}");
        assert!(err.to_string().contains("PURPLE"), "{err}");
    }

    #[test]
    fn test_should_bind_text_value_with_attribute() {
        let context = model_context().expect("context");
        let price = Price {
            currency: "EUR".to_owned(),
            amount: BigDecimal::from_str("12.5").expect("decimal"),
        };
        let xml = to_fragment(&context, &price.to_value()).expect("marshal");
        assert_eq!(xml, r#"<price currency="EUR">12.5</price>"#);
        let back: Price = context
            .unmarshaller()
            .unmarshal(r#"<price currency="EUR"> 12.5 </price>"#.as_bytes())
            .expect("unmarshal");
        assert_eq!(back, price);
    }

    #[test]
    fn test_should_resolve_known_roots_in_untyped_content() {
        let context = model_context().expect("context");
        let xml = concat!(
            "<envelope>",
            "<header>h</header>",
            r#"<person xmlns="urn:example"><name>Ann</name><age>30</age></person>"#,
            r#"<custom a="1">hi</custom>"#,
            "</envelope>"
        );
        let envelope: Envelope = context
            .unmarshaller()
            .unmarshal(xml.as_bytes())
            .expect("unmarshal");
        assert_eq!(envelope.header, "h");
        assert_eq!(envelope.extra.len(), 2);

        let Value::Object(person) = &envelope.extra[0] else {
            panic!("expected an object, found {:?}", envelope.extra[0]);
        };
        assert_eq!(person.key(), TypeKey::of::<Person>());
        assert_eq!(
            Person::from_value(envelope.extra[0].clone()).expect("person"),
            Person::new("Ann", 30)
        );

        let Value::Dynamic(custom) = &envelope.extra[1] else {
            panic!("expected a dynamic element, found {:?}", envelope.extra[1]);
        };
        assert_eq!(custom.name, QName::local("custom"));
        assert_eq!(custom.attribute(&QName::local("a")), Some("1"));
        assert_eq!(custom.text(), "hi");
    }

    #[test]
    fn test_should_write_untyped_content_by_runtime_type() {
        let context = model_context().expect("context");
        let envelope = Envelope {
            header: "h".to_owned(),
            extra: vec![
                Person::new("Bob", 41).to_value(),
                Value::Dynamic(
                    DynamicElement::new(QName::local("custom"))
                        .with_child(DynamicElement::new(QName::local("inner")).with_text("x")),
                ),
            ],
        };
        let xml = to_fragment(&context, &envelope.to_value()).expect("marshal");
        assert_eq!(
            xml,
            concat!(
                "<envelope><header>h</header>",
                r#"<person xmlns="urn:example"><name>Bob</name><age>41</age></person>"#,
                "<custom><inner>x</inner></custom>",
                "</envelope>"
            )
        );
        let back: Envelope = context
            .unmarshaller()
            .unmarshal(xml.as_bytes())
            .expect("unmarshal");
        assert_eq!(back, envelope);
    }

    #[test]
    fn test_should_treat_explicit_nil_as_absent() {
        let context = model_context().expect("context");
        let xml = concat!(
            r#"<item xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" sku="x">"#,
            "<color>BLUE</color>",
            r#"<note xsi:nil="true"/>"#,
            "</item>"
        );
        let back: Item = context
            .unmarshaller()
            .unmarshal(xml.as_bytes())
            .expect("unmarshal");
        assert_eq!(back.note, None);
        assert_eq!(back.color, Color::Blue);
    }

    #[test]
    fn test_should_round_trip_arrays_and_sets() {
        let context = model_context().expect("context");
        let shelf = Shelf {
            slots: [7, 0, -2],
            labels: BTreeSet::from(["b".to_owned(), "a".to_owned()]),
            codes: HashSet::from([10, 20, 30]),
        };
        let xml = to_fragment(&context, &shelf.to_value()).expect("marshal");
        assert!(
            xml.starts_with("<shelf><slot>7</slot><slot>0</slot><slot>-2</slot><label>a</label><label>b</label>"),
            "{xml}"
        );
        assert_eq!(xml.matches("<code>").count(), 3, "{xml}");
        let back: Shelf = context
            .unmarshaller()
            .unmarshal(xml.as_bytes())
            .expect("unmarshal");
        assert_eq!(back, shelf);
    }

    #[test]
    fn test_should_reject_array_of_wrong_length() {
        let context = model_context().expect("context");
        let err = context
            .unmarshaller()
            .unmarshal::<Shelf, _>("<shelf><slot>1</slot></shelf>".as_bytes())
            .expect_err("one slot");
        assert!(err.to_string().contains("expected 3 items"), "{err}");
    }

    #[test]
    fn test_should_capture_undeclared_attributes_in_order() {
        let context = model_context().expect("context");
        let xml = concat!(
            r#"<badge xmlns:m="urn:meta" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
            r#"tone="blue" id="b-1" m:owner="ann" xsi:type="badge">"#,
            "<label>Staff</label></badge>"
        );
        let badge: Badge = context
            .unmarshaller()
            .unmarshal(xml.as_bytes())
            .expect("unmarshal");
        assert_eq!(badge.id, "b-1");
        assert_eq!(
            badge.extras,
            AnyAttributes(vec![
                (QName::local("tone"), "blue".to_owned()),
                (QName::new("urn:meta", "owner"), "ann".to_owned()),
            ])
        );
        assert_eq!(badge.extras.get(&QName::local("tone")), Some("blue"));
        assert_eq!(badge.extras.get(&QName::local("id")), None);
    }

    #[test]
    fn test_should_write_captured_attributes_back() {
        let context = model_context().expect("context");
        let badge = Badge {
            id: "b-1".to_owned(),
            label: "Staff".to_owned(),
            extras: AnyAttributes(vec![
                (QName::local("tone"), "blue".to_owned()),
                (QName::new("urn:meta", "owner").with_prefix("m"), "ann".to_owned()),
            ]),
        };
        let xml = to_fragment(&context, &badge.to_value()).expect("marshal");
        assert_eq!(
            xml,
            r#"<badge id="b-1" tone="blue" xmlns:m="urn:meta" m:owner="ann"><label>Staff</label></badge>"#
        );
        let back: Badge = context
            .unmarshaller()
            .unmarshal(xml.as_bytes())
            .expect("unmarshal");
        assert_eq!(back, badge);
    }

    #[test]
    fn test_should_order_elements_alphabetically() {
        let context = model_context().expect("context");
        let sorted = Sorted {
            zeta: 3,
            alpha: 1,
            mid: 2,
        };
        let xml = to_fragment(&context, &sorted.to_value()).expect("marshal");
        assert_eq!(xml, "<sorted><alpha>1</alpha><mid>2</mid><zeta>3</zeta></sorted>");
        let back: Sorted = context
            .unmarshaller()
            .unmarshal(xml.as_bytes())
            .expect("unmarshal");
        assert_eq!(back, sorted);
    }
}
