//! Listener callbacks around marshalled and unmarshalled objects.

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use xbind_binding::{MarshalListener, Object, UnmarshalListener, XmlBind};

    use crate::model::{Group, Person};
    use crate::model_context;

    #[derive(Debug, Clone, Default)]
    struct Recorder {
        events: Rc<RefCell<Vec<String>>>,
    }

    impl Recorder {
        fn record(&self, phase: &str, object: &Object) {
            let type_name = object.key().name().rsplit("::").next().unwrap_or_default();
            self.events
                .borrow_mut()
                .push(format!("{phase} {type_name}"));
        }

        fn events(&self) -> Vec<String> {
            self.events.borrow().clone()
        }
    }

    impl MarshalListener for Recorder {
        fn before_marshal(&self, object: &Object) {
            self.record("before", object);
        }

        fn after_marshal(&self, object: &Object) {
            self.record("after", object);
        }
    }

    impl UnmarshalListener for Recorder {
        fn before_unmarshal(&self, object: &Object) {
            self.record("before", object);
        }

        fn after_unmarshal(&self, object: &Object) {
            self.record("after", object);
        }
    }

    fn expected() -> Vec<String> {
        [
            "before Group",
            "before Person",
            "after Person",
            "before Person",
            "after Person",
            "after Group",
        ]
        .map(str::to_owned)
        .to_vec()
    }

    fn group() -> Group {
        Group {
            members: vec![Person::new("Ann", 30), Person::new("Bob", 41)],
        }
    }

    #[test]
    fn test_should_notify_around_each_marshalled_object() {
        let context = model_context().expect("context");
        let recorder = Recorder::default();
        let mut marshaller = context.marshaller();
        marshaller.set_fragment(true).set_listener(recorder.clone());
        marshaller
            .marshal_to_string(&group().to_value())
            .expect("marshal");
        assert_eq!(recorder.events(), expected());
    }

    #[test]
    fn test_should_notify_around_each_unmarshalled_object() {
        let context = model_context().expect("context");
        let mut marshaller = context.marshaller();
        marshaller.set_fragment(true);
        let xml = marshaller
            .marshal_to_string(&group().to_value())
            .expect("marshal");

        let recorder = Recorder::default();
        let mut unmarshaller = context.unmarshaller();
        unmarshaller.set_listener(recorder.clone());
        let back: Group = unmarshaller.unmarshal(xml.as_bytes()).expect("unmarshal");
        assert_eq!(back, group());
        assert_eq!(recorder.events(), expected());
    }

    #[test]
    fn test_should_see_read_content_after_unmarshal() {
        struct Names(Rc<RefCell<Vec<Option<String>>>>);

        impl UnmarshalListener for Names {
            fn before_unmarshal(&self, object: &Object) {
                assert!(object.get("name").is_none());
            }

            fn after_unmarshal(&self, object: &Object) {
                let name = match object.get("name") {
                    Some(xbind_binding::Value::String(s)) => Some(s.clone()),
                    _ => None,
                };
                self.0.borrow_mut().push(name);
            }
        }

        let context = model_context().expect("context");
        let names = Rc::new(RefCell::new(Vec::new()));

        let mut unmarshaller = context.unmarshaller();
        unmarshaller.set_listener(Names(Rc::clone(&names)));
        unmarshaller
            .unmarshal_value(
                r#"<person xmlns="urn:example"><name>Ann</name><age>30</age></person>"#.as_bytes(),
            )
            .expect("unmarshal");
        assert_eq!(*names.borrow(), vec![Some("Ann".to_owned())]);
    }
}
