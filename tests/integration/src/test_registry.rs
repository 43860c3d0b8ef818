//! Registry integration tests: skeleton discovery, name indices and
//! collision handling.

#[cfg(test)]
mod tests {
    use xbind_binding::{
        BindError, BindResult, BindingContext, Object, QName, SkeletonState, TypeDescriptor,
        TypeKey, Value, XmlBind,
    };

    use crate::model::{Animal, Category, Cat, Dog, EXAMPLE_NS, Person, Zoo};
    use crate::{init_tracing, model_context};

    /// Claims the root element of [`Person`].
    #[derive(Debug)]
    struct Impostor;

    impl XmlBind for Impostor {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::structure::<Self>()
                .namespace(EXAMPLE_NS)
                .root_element("person")
                .build()
        }

        fn to_value(&self) -> Value {
            Object::of::<Self>().into()
        }

        fn from_value(_: Value) -> BindResult<Self> {
            Ok(Self)
        }
    }

    /// Refers to [`Echo`], which claims the same root element.
    #[derive(Debug)]
    struct Shout;

    impl XmlBind for Shout {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::structure::<Self>()
                .root_element("noise")
                .element::<Option<Echo>>("echo")
                .build()
        }

        fn to_value(&self) -> Value {
            Object::of::<Self>().into()
        }

        fn from_value(_: Value) -> BindResult<Self> {
            Ok(Self)
        }
    }

    #[derive(Debug)]
    struct Echo;

    impl XmlBind for Echo {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::structure::<Self>()
                .root_element("noise")
                .build()
        }

        fn to_value(&self) -> Value {
            Object::of::<Self>().into()
        }

        fn from_value(_: Value) -> BindResult<Self> {
            Ok(Self)
        }
    }

    #[test]
    fn test_should_return_one_skeleton_per_type() {
        init_tracing();
        let mut context = BindingContext::default();
        let first = context.create_skeleton(Person::describe).expect("first");
        let second = context.create_skeleton(Person::describe).expect("second");
        assert_eq!(first, second);
        assert_eq!(context.skeletons().count(), 1);
        let skeleton = context.skeleton(first).expect("skeleton");
        assert_eq!(skeleton.state(), SkeletonState::Ready);
        assert_eq!(skeleton.type_name(), &QName::new(EXAMPLE_NS, "person"));
    }

    #[test]
    fn test_should_bind_recursive_types_once() {
        init_tracing();
        let mut context = BindingContext::default();
        let id = context.create_skeleton(Category::describe).expect("category");
        assert_eq!(context.skeletons().count(), 1);
        assert!(!context.is_pending(TypeKey::of::<Category>()));
        let skeleton = context.skeleton(id).expect("skeleton");
        assert_eq!(skeleton.elements().len(), 1);
        assert_eq!(skeleton.attributes().len(), 1);
    }

    #[test]
    fn test_should_reject_root_element_claimed_by_another_type() {
        init_tracing();
        let err = BindingContext::builder()
            .register::<Person>()
            .register::<Impostor>()
            .build()
            .expect_err("collision");
        assert!(matches!(err, BindError::Configuration(_)));
        assert!(err.to_string().contains("{urn:example}person"), "{err}");
    }

    #[test]
    fn test_should_reject_root_element_claimed_while_pending() {
        init_tracing();
        let mut context = BindingContext::default();
        let err = context
            .create_skeleton(Shout::describe)
            .expect_err("pending collision");
        assert!(err.to_string().contains("still being introspected"), "{err}");
        assert!(!context.is_pending(TypeKey::of::<Shout>()));
    }

    #[test]
    fn test_should_accept_the_same_root_for_the_same_type() {
        init_tracing();
        let mut context = BindingContext::default();
        let id = context.create_skeleton(Person::describe).expect("person");
        context
            .add_root_element(id, QName::new(EXAMPLE_NS, "person"))
            .expect("same type");
        context
            .add_root_element(id, QName::new(EXAMPLE_NS, "boss"))
            .expect("second root");
        assert!(context.has_root_element(&QName::new(EXAMPLE_NS, "boss")));
        assert_eq!(
            context.skeleton(id).and_then(|s| s.element_name()),
            Some(&QName::new(EXAMPLE_NS, "person"))
        );
    }

    #[test]
    fn test_should_reject_registration_after_discovery() {
        let mut context = model_context().expect("context");
        assert!(context.is_discovery_finished());
        let err = context
            .create_skeleton(Impostor::describe)
            .expect_err("finished");
        assert!(err.to_string().contains("after discovery"), "{err}");
        // Known types are still returned.
        context.create_skeleton(Person::describe).expect("known");
    }

    #[test]
    fn test_should_index_roots_and_type_names() {
        let context = model_context().expect("context");
        assert!(context.has_root_element(&QName::new(EXAMPLE_NS, "person")));
        assert!(context.has_root_element(&QName::local("zoo")));
        assert!(!context.has_root_element(&QName::local("person")));
        assert!(context.has_type_name(&QName::local("animal")));
        assert_eq!(
            context
                .root_skeleton(&QName::local("dog"))
                .map(xbind_binding::Skeleton::key),
            Some(TypeKey::of::<Dog>())
        );
        assert!(context.skeleton_for_key(TypeKey::of::<Zoo>()).is_some());
    }

    #[test]
    fn test_should_register_supertypes_and_list_assignable_roots() {
        let context = model_context().expect("context");
        let animal = context
            .skeleton_for_key(TypeKey::of::<Animal>())
            .expect("animal skeleton");
        assert!(animal.is_abstract());
        assert!(animal.element_name().is_none());

        let roots: Vec<&str> = context
            .root_elements_assignable_to(TypeKey::of::<Animal>())
            .into_iter()
            .map(QName::local_part)
            .collect();
        assert_eq!(roots, vec!["cat", "dog"]);
        let cats = context.root_elements_assignable_to(TypeKey::of::<Cat>());
        assert_eq!(cats, vec![&QName::local("cat")]);
    }

    #[test]
    fn test_should_find_skeleton_through_supertype() {
        let context = model_context().expect("context");
        let skeleton = context
            .find_skeleton_for_type(TypeKey::of::<Dog>(), Dog::describe)
            .expect("dog");
        assert_eq!(skeleton.key(), TypeKey::of::<Dog>());
        assert!(
            context
                .find_skeleton_for_type(TypeKey::of::<Impostor>(), Impostor::describe)
                .is_none()
        );
    }

    #[test]
    fn test_should_register_enums_once() {
        let context = model_context().expect("context");
        assert_eq!(context.enums().len(), 1);
        let color = &context.enums()[0];
        assert_eq!(color.type_name().local_part(), "color");
        assert_eq!(color.constants(), ["RED", "GREEN", "BLUE"]);
    }
}
