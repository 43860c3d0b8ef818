//! Schema generation over the model types.

#[cfg(test)]
mod tests {
    use xbind_binding::{
        BindResult, BindingConfig, BindingContext, Document, Object, TypeDescriptor, Value,
        XmlBind,
    };

    use crate::{init_tracing, model_context};

    fn schema() -> String {
        model_context()
            .expect("context")
            .schema_to_string()
            .expect("schema")
    }

    #[test]
    fn test_should_write_well_formed_schema() {
        let xsd = schema();
        let doc = Document::parse(xsd.as_bytes()).expect("well formed");
        let root = doc.document_element().expect("schema element");
        let name = doc.name(root).expect("element name");
        assert_eq!(name.local_part(), "schema");
        assert_eq!(name.namespace(), Some("http://www.w3.org/2001/XMLSchema"));
        assert!(xsd.contains(r#"targetNamespace="urn:example""#), "{xsd}");
        assert!(xsd.contains(r#"elementFormDefault="qualified""#), "{xsd}");
        assert!(xsd.contains(r#"xmlns:tns="urn:example""#), "{xsd}");
    }

    #[test]
    fn test_should_declare_root_elements_and_complex_types() {
        let xsd = schema();
        assert!(xsd.contains(r#"<xsd:element name="person" type="tns:person"/>"#), "{xsd}");
        assert!(xsd.contains(r#"<xsd:complexType name="person">"#), "{xsd}");
        assert!(
            xsd.contains(r#"<xsd:element name="name" type="xsd:string" minOccurs="0"/>"#),
            "{xsd}"
        );
        assert!(
            xsd.contains(
                r#"<xsd:element name="members" type="tns:person" minOccurs="0" maxOccurs="unbounded"/>"#
            ),
            "{xsd}"
        );
    }

    #[test]
    fn test_should_describe_inheritance() {
        let xsd = schema();
        assert!(
            xsd.contains(r#"<xsd:complexType name="animal" abstract="true">"#),
            "{xsd}"
        );
        assert!(xsd.contains(r#"<xsd:extension base="animal">"#), "{xsd}");
        assert!(xsd.contains(r#"<xsd:element name="dog" type="dog"/>"#), "{xsd}");
    }

    #[test]
    fn test_should_describe_simple_content_and_lists() {
        let xsd = schema();
        assert!(xsd.contains(r#"<xsd:simpleType name="color">"#), "{xsd}");
        assert!(xsd.contains(r#"<xsd:enumeration value="RED"/>"#), "{xsd}");
        assert!(xsd.contains(r#"<xsd:list itemType="xsd:int"/>"#), "{xsd}");
        assert!(
            xsd.contains(r#"<xsd:attribute name="sku" type="xsd:string" use="required"/>"#),
            "{xsd}"
        );
        assert!(xsd.contains(r#"nillable="true""#), "{xsd}");
        assert!(xsd.contains(r#"<xsd:simpleContent>"#), "{xsd}");
        assert!(xsd.contains(r#"<xsd:extension base="xsd:decimal">"#), "{xsd}");
        assert!(
            xsd.contains(r#"<xsd:any processContents="lax" minOccurs="0" maxOccurs="unbounded"/>"#),
            "{xsd}"
        );
        assert!(xsd.contains(r#"<xsd:element name="entry" minOccurs="0" maxOccurs="unbounded">"#), "{xsd}");
    }

    #[test]
    fn test_should_describe_attribute_catch_all() {
        let xsd = schema();
        let badge = xsd.find(r#"<xsd:complexType name="badge">"#).expect("badge type");
        let any = xsd[badge..]
            .find(r#"<xsd:anyAttribute processContents="lax"/>"#)
            .expect("any attribute");
        let end = xsd[badge..].find("</xsd:complexType>").expect("end of badge");
        assert!(any < end, "{xsd}");
    }

    #[test]
    fn test_should_write_enumerations_after_types() {
        let xsd = schema();
        let enumeration = xsd.find(r#"<xsd:simpleType name="color">"#).expect("enum");
        let last_type = xsd.rfind("<xsd:complexType").expect("complex type");
        assert!(enumeration > last_type);
    }

    /// Takes its namespace from the configuration.
    #[derive(Debug)]
    struct Setting;

    impl XmlBind for Setting {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::structure::<Self>()
                .root_element("setting")
                .element::<String>("key")
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
    fn test_should_use_configured_target_namespace() {
        init_tracing();
        let config = BindingConfig {
            target_namespace: Some("urn:settings".to_owned()),
            ..BindingConfig::default()
        };
        let context = BindingContext::builder()
            .config(config)
            .register::<Setting>()
            .build()
            .expect("context");
        let xsd = context.schema_to_string().expect("schema");
        assert!(xsd.contains(r#"targetNamespace="urn:settings""#), "{xsd}");
        assert!(xsd.contains(r#"<xsd:element name="setting" type="tns:setting"/>"#), "{xsd}");
    }
}
