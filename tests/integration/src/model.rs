//! Bound types shared by the integration tests.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use bigdecimal::BigDecimal;
use xbind_binding::{
    AccessorOrder, AnyAttributes, BindError, BindResult, HexBinary, Object, PropertyDescriptor,
    TypeDescriptor, TypeKey, Value, XmlBind, bind_enum,
};

/// Namespace of the people types.
pub const EXAMPLE_NS: &str = "urn:example";

/// A person, bound to `{urn:example}person`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub name: String,
    pub age: i32,
}

impl Person {
    #[must_use]
    pub fn new(name: &str, age: i32) -> Self {
        Self {
            name: name.to_owned(),
            age,
        }
    }
}

impl XmlBind for Person {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::structure::<Self>()
            .namespace(EXAMPLE_NS)
            .root_element("person")
            .element::<String>("name")
            .element::<i32>("age")
            .build()
    }

    fn to_value(&self) -> Value {
        Object::of::<Self>()
            .with("name", self.name.to_value())
            .with("age", self.age.to_value())
            .into()
    }

    fn from_value(value: Value) -> BindResult<Self> {
        let mut object = value.into_object()?;
        Ok(Self {
            name: object.take("name")?,
            age: object.take("age")?,
        })
    }
}

/// A group of people; every member is a `members` element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub members: Vec<Person>,
}

impl XmlBind for Group {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::structure::<Self>()
            .namespace(EXAMPLE_NS)
            .root_element("group")
            .element::<Vec<Person>>("members")
            .build()
    }

    fn to_value(&self) -> Value {
        Object::of::<Self>()
            .with("members", self.members.to_value())
            .into()
    }

    fn from_value(value: Value) -> BindResult<Self> {
        let mut object = value.into_object()?;
        Ok(Self {
            members: object.take("members")?,
        })
    }
}

/// A self-referential tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Category {
    pub name: String,
    pub children: Vec<Category>,
}

impl XmlBind for Category {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::structure::<Self>()
            .root_element("category")
            .attribute::<String>("name")
            .property(PropertyDescriptor::element::<Vec<Category>>("children").named("category"))
            .build()
    }

    fn to_value(&self) -> Value {
        Object::of::<Self>()
            .with("name", self.name.to_value())
            .with("children", self.children.to_value())
            .into()
    }

    fn from_value(value: Value) -> BindResult<Self> {
        let mut object = value.into_object()?;
        Ok(Self {
            name: object.take("name")?,
            children: object.take("children")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Blue,
}

bind_enum!(Color { Red => "RED", Green => "GREEN", Blue => "BLUE" });

/// A catalog item exercising attributes, enums, xml lists, maps, `xsi:nil`
/// and binary content.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub sku: String,
    pub color: Color,
    pub sizes: Vec<i32>,
    pub counts: BTreeMap<String, i32>,
    pub note: Option<String>,
    pub checksum: Option<HexBinary>,
}

impl XmlBind for Item {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::structure::<Self>()
            .root_element("item")
            .property(PropertyDescriptor::attribute::<String>("sku").required())
            .element::<Color>("color")
            .property(PropertyDescriptor::element::<Vec<i32>>("sizes").xml_list())
            .element::<BTreeMap<String, i32>>("counts")
            .property(PropertyDescriptor::element::<Option<String>>("note").nillable())
            .element::<Option<HexBinary>>("checksum")
            .build()
    }

    fn to_value(&self) -> Value {
        Object::of::<Self>()
            .with("sku", self.sku.to_value())
            .with("color", self.color.to_value())
            .with("sizes", self.sizes.to_value())
            .with("counts", self.counts.to_value())
            .with("note", self.note.to_value())
            .with("checksum", self.checksum.to_value())
            .into()
    }

    fn from_value(value: Value) -> BindResult<Self> {
        let mut object = value.into_object()?;
        Ok(Self {
            sku: object.take("sku")?,
            color: object.take("color")?,
            sizes: object.take("sizes")?,
            counts: object.take("counts")?,
            note: object.take("note")?,
            checksum: object.take("checksum")?,
        })
    }
}

/// The abstract base of [`Dog`] and [`Cat`].
#[derive(Debug, Clone, PartialEq)]
pub enum Animal {
    Dog(Dog),
    Cat(Cat),
}

impl XmlBind for Animal {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::structure::<Self>()
            .type_name("animal")
            .is_abstract()
            .element::<String>("name")
            .build()
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Dog(dog) => dog.to_value(),
            Self::Cat(cat) => cat.to_value(),
        }
    }

    fn from_value(value: Value) -> BindResult<Self> {
        let key = match &value {
            Value::Object(object) => object.key(),
            other => {
                return Err(BindError::Unmarshal(format!(
                    "expected an animal, found {}",
                    other.kind_name()
                )));
            }
        };
        if key == TypeKey::of::<Dog>() {
            Dog::from_value(value).map(Self::Dog)
        } else if key == TypeKey::of::<Cat>() {
            Cat::from_value(value).map(Self::Cat)
        } else {
            Err(BindError::Unmarshal(format!("{key} is not an animal")))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dog {
    pub name: String,
    pub breed: String,
}

impl XmlBind for Dog {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::structure::<Self>()
            .extends::<Animal>()
            .root_element("dog")
            .element::<String>("breed")
            .build()
    }

    fn to_value(&self) -> Value {
        Object::of::<Self>()
            .with("name", self.name.to_value())
            .with("breed", self.breed.to_value())
            .into()
    }

    fn from_value(value: Value) -> BindResult<Self> {
        let mut object = value.into_object()?;
        Ok(Self {
            name: object.take("name")?,
            breed: object.take("breed")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cat {
    pub name: String,
    pub lives: u8,
}

impl XmlBind for Cat {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::structure::<Self>()
            .extends::<Animal>()
            .root_element("cat")
            .element::<u8>("lives")
            .build()
    }

    fn to_value(&self) -> Value {
        Object::of::<Self>()
            .with("name", self.name.to_value())
            .with("lives", self.lives.to_value())
            .into()
    }

    fn from_value(value: Value) -> BindResult<Self> {
        let mut object = value.into_object()?;
        Ok(Self {
            name: object.take("name")?,
            lives: object.take("lives")?,
        })
    }
}

/// Animals written as `animal` elements with an `xsi:type`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Zoo {
    pub animals: Vec<Animal>,
}

impl XmlBind for Zoo {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::structure::<Self>()
            .root_element("zoo")
            .property(PropertyDescriptor::element::<Vec<Animal>>("animals").named("animal"))
            .build()
    }

    fn to_value(&self) -> Value {
        Object::of::<Self>()
            .with("animals", self.animals.to_value())
            .into()
    }

    fn from_value(value: Value) -> BindResult<Self> {
        let mut object = value.into_object()?;
        Ok(Self {
            animals: object.take("animals")?,
        })
    }
}

/// A text-only element with an attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Price {
    pub currency: String,
    pub amount: BigDecimal,
}

impl XmlBind for Price {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::structure::<Self>()
            .root_element("price")
            .attribute::<String>("currency")
            .value::<BigDecimal>("amount")
            .build()
    }

    fn to_value(&self) -> Value {
        Object::of::<Self>()
            .with("currency", self.currency.to_value())
            .with("amount", self.amount.to_value())
            .into()
    }

    fn from_value(value: Value) -> BindResult<Self> {
        let mut object = value.into_object()?;
        Ok(Self {
            currency: object.take("currency")?,
            amount: object.take("amount")?,
        })
    }
}

/// A header plus whatever other elements appear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub header: String,
    pub extra: Vec<Value>,
}

impl XmlBind for Envelope {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::structure::<Self>()
            .root_element("envelope")
            .element::<String>("header")
            .any_element("extra")
            .build()
    }

    fn to_value(&self) -> Value {
        Object::of::<Self>()
            .with("header", self.header.to_value())
            .with("extra", Value::List(self.extra.clone()))
            .into()
    }

    fn from_value(value: Value) -> BindResult<Self> {
        let mut object = value.into_object()?;
        Ok(Self {
            header: object.take("header")?,
            extra: object.take("extra")?,
        })
    }
}

/// Never registered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stranger {
    pub name: String,
}

impl XmlBind for Stranger {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::structure::<Self>()
            .root_element("stranger")
            .element::<String>("name")
            .build()
    }

    fn to_value(&self) -> Value {
        Object::of::<Self>()
            .with("name", self.name.to_value())
            .into()
    }

    fn from_value(value: Value) -> BindResult<Self> {
        let mut object = value.into_object()?;
        Ok(Self {
            name: object.take("name")?,
        })
    }
}

/// Fixed-size and unordered sequences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shelf {
    pub slots: [i32; 3],
    pub labels: BTreeSet<String>,
    pub codes: HashSet<u32>,
}

impl XmlBind for Shelf {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::structure::<Self>()
            .root_element("shelf")
            .property(PropertyDescriptor::element::<[i32; 3]>("slots").named("slot"))
            .property(PropertyDescriptor::element::<BTreeSet<String>>("labels").named("label"))
            .property(PropertyDescriptor::element::<HashSet<u32>>("codes").named("code"))
            .build()
    }

    fn to_value(&self) -> Value {
        Object::of::<Self>()
            .with("slots", self.slots.to_value())
            .with("labels", self.labels.to_value())
            .with("codes", self.codes.to_value())
            .into()
    }

    fn from_value(value: Value) -> BindResult<Self> {
        let mut object = value.into_object()?;
        Ok(Self {
            slots: object.take("slots")?,
            labels: object.take("labels")?,
            codes: object.take("codes")?,
        })
    }
}

/// Refers to [`Book`], which refers back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Author {
    pub name: String,
    pub books: Vec<Book>,
}

impl XmlBind for Author {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::structure::<Self>()
            .root_element("author")
            .element::<String>("name")
            .property(PropertyDescriptor::element::<Vec<Book>>("books").named("book"))
            .build()
    }

    fn to_value(&self) -> Value {
        Object::of::<Self>()
            .with("name", self.name.to_value())
            .with("books", self.books.to_value())
            .into()
    }

    fn from_value(value: Value) -> BindResult<Self> {
        let mut object = value.into_object()?;
        Ok(Self {
            name: object.take("name")?,
            books: object.take("books")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Book {
    pub title: String,
    pub editor: Option<Box<Author>>,
}

impl XmlBind for Book {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::structure::<Self>()
            .element::<String>("title")
            .element::<Option<Box<Author>>>("editor")
            .build()
    }

    fn to_value(&self) -> Value {
        Object::of::<Self>()
            .with("title", self.title.to_value())
            .with("editor", self.editor.to_value())
            .into()
    }

    fn from_value(value: Value) -> BindResult<Self> {
        let mut object = value.into_object()?;
        Ok(Self {
            title: object.take("title")?,
            editor: object.take("editor")?,
        })
    }
}

/// Keeps attributes it does not declare.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Badge {
    pub id: String,
    pub label: String,
    pub extras: AnyAttributes,
}

impl XmlBind for Badge {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::structure::<Self>()
            .root_element("badge")
            .attribute::<String>("id")
            .element::<String>("label")
            .any_attribute("extras")
            .build()
    }

    fn to_value(&self) -> Value {
        Object::of::<Self>()
            .with("id", self.id.to_value())
            .with("label", self.label.to_value())
            .with("extras", self.extras.to_value())
            .into()
    }

    fn from_value(value: Value) -> BindResult<Self> {
        let mut object = value.into_object()?;
        Ok(Self {
            id: object.take("id")?,
            label: object.take("label")?,
            extras: object.take("extras")?,
        })
    }
}

/// Elements written in field-name order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sorted {
    pub zeta: i32,
    pub alpha: i32,
    pub mid: i32,
}

impl XmlBind for Sorted {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::structure::<Self>()
            .root_element("sorted")
            .accessor_order(AccessorOrder::Alphabetical)
            .element::<i32>("zeta")
            .element::<i32>("alpha")
            .element::<i32>("mid")
            .build()
    }

    fn to_value(&self) -> Value {
        Object::of::<Self>()
            .with("zeta", self.zeta.to_value())
            .with("alpha", self.alpha.to_value())
            .with("mid", self.mid.to_value())
            .into()
    }

    fn from_value(value: Value) -> BindResult<Self> {
        let mut object = value.into_object()?;
        Ok(Self {
            zeta: object.take("zeta")?,
            alpha: object.take("alpha")?,
            mid: object.take("mid")?,
        })
    }
}
