//! Subtype handling: inherited properties, `xsi:type` and abstract types.

#[cfg(test)]
mod tests {
    use xbind_binding::{BindError, XmlBind};

    use crate::model::{Animal, Cat, Dog, Zoo};
    use crate::{model_context, to_fragment};

    fn zoo() -> Zoo {
        Zoo {
            animals: vec![
                Animal::Dog(Dog {
                    name: "Rex".to_owned(),
                    breed: "collie".to_owned(),
                }),
                Animal::Cat(Cat {
                    name: "Tom".to_owned(),
                    lives: 9,
                }),
            ],
        }
    }

    #[test]
    fn test_should_write_subtypes_with_xsi_type() {
        let context = model_context().expect("context");
        let xml = to_fragment(&context, &zoo().to_value()).expect("marshal");
        assert!(xml.starts_with("<zoo><animal "), "{xml}");
        assert!(xml.contains(r#"xsi:type="dog""#), "{xml}");
        assert!(xml.contains(r#"xsi:type="cat""#), "{xml}");
        assert!(
            xml.contains("<name>Rex</name><breed>collie</breed></animal>"),
            "{xml}"
        );
        assert!(xml.contains("<name>Tom</name><lives>9</lives></animal>"), "{xml}");
    }

    #[test]
    fn test_should_round_trip_subtypes() {
        let context = model_context().expect("context");
        let original = zoo();
        let xml = to_fragment(&context, &original.to_value()).expect("marshal");
        let back: Zoo = context
            .unmarshaller()
            .unmarshal(xml.as_bytes())
            .expect("unmarshal");
        assert_eq!(back, original);
    }

    #[test]
    fn test_should_write_subtype_as_its_own_root() {
        let context = model_context().expect("context");
        let dog = Dog {
            name: "Rex".to_owned(),
            breed: "collie".to_owned(),
        };
        let xml = to_fragment(&context, &dog.to_value()).expect("marshal");
        assert_eq!(xml, "<dog><name>Rex</name><breed>collie</breed></dog>");
        let back: Dog = context
            .unmarshaller()
            .unmarshal(xml.as_bytes())
            .expect("unmarshal");
        assert_eq!(back, dog);
    }

    #[test]
    fn test_should_unmarshal_subtype_root_as_supertype() {
        let context = model_context().expect("context");
        let animal: Animal = context
            .unmarshaller()
            .unmarshal("<cat><name>Tom</name><lives>7</lives></cat>".as_bytes())
            .expect("unmarshal");
        assert_eq!(
            animal,
            Animal::Cat(Cat {
                name: "Tom".to_owned(),
                lives: 7,
            })
        );
    }

    #[test]
    fn test_should_refuse_to_instantiate_abstract_type() {
        let context = model_context().expect("context");
        let err = context
            .unmarshaller()
            .unmarshal_value("<zoo><animal><name>Rex</name></animal></zoo>".as_bytes())
            .expect_err("abstract");
        assert!(matches!(err, BindError::Unmarshal(_)));
        assert!(err.to_string().contains("cannot instantiate abstract type"), "{err}");
    }

    #[test]
    fn test_should_ignore_xsi_type_of_unrelated_type() {
        let context = model_context().expect("context");
        let xml = concat!(
            r#"<zoo xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            r#"<animal xsi:type="zoo"><name>Rex</name></animal>"#,
            "</zoo>"
        );
        let err = context
            .unmarshaller()
            .unmarshal_value(xml.as_bytes())
            .expect_err("zoo is not an animal");
        assert!(err.to_string().contains("abstract"), "{err}");
    }
}
