//! Entity types and sample data.

use helios_crud::core::{
    Entity, EntityType, FieldDef, FieldValue, Reflect, from_value, unknown_field,
};
use helios_crud::error::StorageResult;
use serde_json::Value;

pub static ADDRESS: EntityType =
    EntityType::new("Address", &[FieldDef::simple("city"), FieldDef::simple("zip")]);

pub static PERSON: EntityType = EntityType::new(
    "Person",
    &[
        FieldDef::simple("id"),
        FieldDef::simple("name"),
        FieldDef::simple("age"),
        FieldDef::composite("address", || &ADDRESS),
        FieldDef::multi_valued("tags"),
    ],
)
.with_key("id");

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub city: Option<String>,
    pub zip: Option<String>,
}

impl Reflect for Address {
    fn entity_type(&self) -> &'static EntityType {
        &ADDRESS
    }

    fn get_field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "city" => FieldValue::optional(self.city.clone()),
            "zip" => FieldValue::optional(self.zip.clone()),
            _ => FieldValue::Null,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub age: Option<i64>,
    pub address: Option<Address>,
    pub tags: Vec<String>,
}

impl Person {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn aged(mut self, age: i64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn living_in(mut self, city: &str) -> Self {
        self.address = Some(Address {
            city: Some(city.to_string()),
            zip: None,
        });
        self
    }

    pub fn tagged(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn template() -> Self {
        Self::default()
    }
}

impl Reflect for Person {
    fn entity_type(&self) -> &'static EntityType {
        &PERSON
    }

    fn get_field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "id" => FieldValue::optional(self.id),
            "name" => FieldValue::optional(self.name.clone()),
            "age" => FieldValue::optional(self.age),
            "address" => FieldValue::composite(self.address.as_ref()),
            "tags" => FieldValue::multi(&self.tags),
            _ => FieldValue::Null,
        }
    }
}

impl Entity for Person {
    fn metadata() -> &'static EntityType {
        &PERSON
    }

    fn set_field(&mut self, name: &str, value: Value) -> StorageResult<()> {
        match name {
            "id" => self.id = from_value(&PERSON, name, value)?,
            "name" => self.name = from_value(&PERSON, name, value)?,
            "age" => self.age = from_value(&PERSON, name, value)?,
            "tags" => self.tags = from_value(&PERSON, name, value)?,
            _ => return Err(unknown_field(&PERSON, name)),
        }
        Ok(())
    }
}

/// Five people; Steve and Sam live in Boston, Alice has no address.
pub fn create_people() -> Vec<Person> {
    vec![
        Person::named("Steve").aged(41).living_in("Boston").tagged(&["admin"]),
        Person::named("Sam").aged(29).living_in("Boston"),
        Person::named("Alice").aged(35).tagged(&["admin", "ops"]),
        Person::named("Bob").aged(52).living_in("Denver"),
        Person::named("Carol").aged(23).living_in("Austin"),
    ]
}

pub fn names(people: &[Person]) -> Vec<&str> {
    people.iter().filter_map(|p| p.name.as_deref()).collect()
}

pub fn sorted(mut names: Vec<&str>) -> Vec<&str> {
    names.sort_unstable();
    names
}
