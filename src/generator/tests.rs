#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::error::GenerateError;
use crate::spec::{parse_schema_table, SchemaTable};
use std::collections::HashMap;
use std::path::Path;

fn table(yaml: &str) -> SchemaTable {
    parse_schema_table(yaml, true).unwrap()
}

fn model<'a>(models: &'a [GeneratedModel], name: &str) -> &'a GeneratedModel {
    models
        .iter()
        .find(|m| m.name == name)
        .unwrap_or_else(|| panic!("no model named {name}"))
}

fn field_names(model: &GeneratedModel) -> Vec<&str> {
    model.fields().iter().map(|f| f.name.as_str()).collect()
}

fn modules_for(models: &[GeneratedModel]) -> HashMap<String, String> {
    models
        .iter()
        .map(|m| (m.name.clone(), to_snake_case(&m.name)))
        .collect()
}

const SHOP_YAML: &str = r#"
components:
  schemas:
    Order:
      description: A placed order.
      required: [sku, status]
      properties:
        sku:
          type: string
          maxLength: 32
          pattern: "^[A-Z0-9-]+$"
        status:
          type: string
          enum: [pending, shipped, cancelled]
        placed_at:
          type: string
          format: date-time
        order-id:
          type: integer
          minimum: 1
        type:
          type: string
    Customer:
      properties:
        email: { type: string, unique: true, index: true }
        name: { type: string, nullable: false }
        tier: { type: string, default: basic }
    Cart:
      properties:
        items:
          type: array
          items:
            type: object
            properties:
              sku: { type: string }
              qty: { type: integer }
        owner:
          $ref: '#/components/schemas/Customer'
"#;

#[test]
fn test_fields_keep_declaration_order() {
    let yaml = r#"
components:
  schemas:
    Scrambled:
      properties:
        zeta: { type: string }
        alpha: { type: integer }
        mid: { type: boolean }
"#;
    for flavor in [Flavor::Validation, Flavor::Persistence] {
        let models = build_models(&table(yaml), flavor).unwrap();
        let scrambled = model(&models, "Scrambled");
        let names = field_names(scrambled);
        assert_eq!(&names[..3], ["zeta", "alpha", "mid"], "flavor {flavor}");
    }
}

#[test]
fn test_validation_field_types_and_requiredness() {
    let models = build_models(&table(SHOP_YAML), Flavor::Validation).unwrap();
    let order = model(&models, "Order");
    assert_eq!(field_names(order), ["sku", "status", "placed_at", "orderid", "type"]);

    let fields = order.fields();
    assert!(fields[0].required);
    assert_eq!(fields[0].ty.expr, TypeExpr::Primitive(Primitive::Text));
    assert_eq!(
        fields[1].ty.expr,
        TypeExpr::Named {
            name: "OrderStatus".to_string(),
            kind: RefKind::Enum
        }
    );
    assert!(!fields[2].required);
    assert_eq!(fields[2].ty.expr, TypeExpr::Primitive(Primitive::Timestamp));
    assert_eq!(fields[3].raw_name, "order-id");
}

#[test]
fn test_persistence_appends_identity_last() {
    let models = build_models(&table(SHOP_YAML), Flavor::Persistence).unwrap();
    let customer = model(&models, "Customer");
    assert_eq!(field_names(customer), ["email", "name", "tier", "id"]);

    let fields = customer.fields();
    // nullable unless explicitly `nullable: false`
    assert_eq!(
        fields[0].ty.expr,
        TypeExpr::Optional(Box::new(TypeExpr::Primitive(Primitive::Text)))
    );
    assert!(!fields[0].required);
    assert_eq!(fields[1].ty.expr, TypeExpr::Primitive(Primitive::Text));
    assert!(fields[1].required);

    let id = &fields[3];
    assert!(id.synthetic);
    assert!(id.is_primary());
    assert_eq!(id.ty.expr, TypeExpr::Primitive(Primitive::Integer));
}

#[test]
fn test_persistence_keeps_declared_primary_key() {
    let yaml = r#"
components:
  schemas:
    Account:
      properties:
        id: { type: string, format: uuid, primary_key: true }
        handle: { type: string }
"#;
    let models = build_models(&table(yaml), Flavor::Persistence).unwrap();
    let account = model(&models, "Account");
    assert_eq!(field_names(account), ["id", "handle"]);
    assert_eq!(account.fields()[0].ty.expr, TypeExpr::Primitive(Primitive::Uuid));
    assert!(account.fields().iter().all(|f| !f.synthetic));
}

#[test]
fn test_persistence_identity_avoids_declared_id() {
    let yaml = r#"
components:
  schemas:
    Legacy:
      properties:
        id: { type: string }
"#;
    let models = build_models(&table(yaml), Flavor::Persistence).unwrap();
    assert_eq!(field_names(model(&models, "Legacy")), ["id", "id_2"]);
}

#[test]
fn test_persistence_keeps_first_primary_key_only() {
    let yaml = r#"
components:
  schemas:
    Pair:
      properties:
        a: { type: string, primary_key: true }
        b: { type: string, primary_key: true }
"#;
    let models = build_models(&table(yaml), Flavor::Persistence).unwrap();
    let pair = model(&models, "Pair");
    assert_eq!(field_names(pair), ["a", "b"]);

    let primaries: Vec<&str> = pair
        .fields()
        .iter()
        .filter(|f| f.is_primary())
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(primaries, ["a"]);

    let b = &pair.fields()[1];
    assert!(b.ty.constraints.unique);
    assert_eq!(
        b.ty.expr,
        TypeExpr::Optional(Box::new(TypeExpr::Primitive(Primitive::Text)))
    );

    let source = render_model(pair, &modules_for(&models)).unwrap();
    assert!(source.contains("    #[sea_orm(primary_key, auto_increment = false)]\n    pub a: String,"));
    assert!(source.contains("    #[sea_orm(unique)]\n    pub b: Option<String>,"));
}

#[test]
fn test_nested_array_of_object_precedes_owner() {
    let models = build_models(&table(SHOP_YAML), Flavor::Validation).unwrap();
    let order: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
    let item = order.iter().position(|n| *n == "CartItemsItem").unwrap();
    let cart = order.iter().position(|n| *n == "Cart").unwrap();
    assert!(item < cart, "satellite must come first: {order:?}");

    let nested = model(&models, "CartItemsItem");
    assert_eq!(nested.origin, ModelOrigin::Nested);
    assert_eq!(field_names(nested), ["sku", "qty"]);

    let cart = model(&models, "Cart");
    assert_eq!(
        cart.fields()[0].ty.expr,
        TypeExpr::Sequence(Box::new(TypeExpr::Named {
            name: "CartItemsItem".to_string(),
            kind: RefKind::Model
        }))
    );
    assert_eq!(
        cart.fields()[1].ty.expr,
        TypeExpr::Named {
            name: "Customer".to_string(),
            kind: RefKind::Model
        }
    );
}

#[test]
fn test_persistence_does_not_expand_nested_objects() {
    let models = build_models(&table(SHOP_YAML), Flavor::Persistence).unwrap();
    assert!(models.iter().all(|m| m.name != "CartItemsItem"));
    let cart = model(&models, "Cart");
    assert_eq!(
        cart.fields()[0].ty.expr,
        TypeExpr::Optional(Box::new(TypeExpr::Sequence(Box::new(TypeExpr::Primitive(
            Primitive::Map
        )))))
    );
}

#[test]
fn test_referenced_schema_is_built_once_before_referrer() {
    let yaml = r#"
components:
  schemas:
    Invoice:
      properties:
        payer: { $ref: '#/components/schemas/Party' }
        payee: { $ref: '#/components/schemas/Party' }
    Party:
      properties:
        name: { type: string }
"#;
    let models = build_models(&table(yaml), Flavor::Validation).unwrap();
    let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["Party", "Invoice"]);
}

#[test]
fn test_enum_synthesized_with_sanitized_members() {
    let models = build_models(&table(SHOP_YAML), Flavor::Validation).unwrap();
    let status = model(&models, "OrderStatus");
    assert_eq!(status.origin, ModelOrigin::Enum);
    assert_eq!(status.raw_name, "Order_status");
    let members: Vec<(&str, &str)> = status
        .members()
        .iter()
        .map(|m| (m.name.as_str(), m.value.as_str()))
        .collect();
    assert_eq!(
        members,
        [("PENDING", "pending"), ("SHIPPED", "shipped"), ("CANCELLED", "cancelled")]
    );

    let position = |name: &str| models.iter().position(|m| m.name == name).unwrap();
    assert!(position("OrderStatus") < position("Order"));
}

#[test]
fn test_enum_reemission_is_idempotent() {
    let yaml = r#"
components:
  schemas:
    Ticket:
      properties:
        state: { type: string, title: Status, enum: [open, closed] }
        previous_state: { type: string, title: Status, enum: [open, closed] }
        review: { type: string, title: Status, enum: [draft, final] }
"#;
    let models = build_models(&table(yaml), Flavor::Validation).unwrap();
    let enums: Vec<&str> = models
        .iter()
        .filter(|m| m.is_enum())
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(enums, ["Status", "Status_2"]);

    let ticket = model(&models, "Ticket");
    let refs: Vec<Vec<(&str, RefKind)>> = ticket
        .fields()
        .iter()
        .map(|f| f.ty.expr.named_refs())
        .collect();
    assert_eq!(refs[0], refs[1]);
    assert_eq!(refs[2], vec![("Status_2", RefKind::Enum)]);
}

#[test]
fn test_enum_titled_like_a_schema_is_emitted_once() {
    let yaml = r#"
components:
  schemas:
    Status:
      properties:
        code: { type: integer }
    Issue:
      properties:
        state: { type: string, title: Status, enum: [open, closed] }
        resolution: { type: string, title: Status, enum: [open, closed] }
"#;
    let models = build_models(&table(yaml), Flavor::Validation).unwrap();
    let enums: Vec<&str> = models
        .iter()
        .filter(|m| m.is_enum())
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(enums, ["Status_2"]);
    assert!(!model(&models, "Status").is_enum());

    let issue = model(&models, "Issue");
    for field in issue.fields() {
        assert_eq!(field.ty.expr.named_refs(), vec![("Status_2", RefKind::Enum)]);
    }
}

#[test]
fn test_duplicate_enum_values_collapse() {
    let yaml = r#"
components:
  schemas:
    Light:
      properties:
        color: { enum: [red, red, green] }
"#;
    let models = build_models(&table(yaml), Flavor::Validation).unwrap();
    assert_eq!(model(&models, "LightColor").members().len(), 2);
}

#[test]
fn test_cyclic_reference_is_rejected() {
    let yaml = r#"
components:
  schemas:
    A:
      properties:
        b: { $ref: '#/components/schemas/B' }
    B:
      properties:
        a: { $ref: '#/components/schemas/A' }
"#;
    let err = build_models(&table(yaml), Flavor::Validation).unwrap_err();
    match err {
        GenerateError::CyclicSchema { chain } => assert_eq!(chain, ["A", "B", "A"]),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_self_reference_through_array_is_rejected() {
    let yaml = r#"
components:
  schemas:
    Node:
      properties:
        children:
          type: array
          items: { $ref: '#/components/schemas/Node' }
"#;
    let err = build_models(&table(yaml), Flavor::Persistence).unwrap_err();
    assert!(matches!(err, GenerateError::CyclicSchema { .. }));
}

#[test]
fn test_nested_name_shared_with_component_is_not_a_cycle() {
    let yaml = r#"
components:
  schemas:
    Cart:
      properties:
        items:
          type: array
          items:
            type: object
            properties:
              detail: { $ref: '#/components/schemas/Cart_items_item' }
    Cart_items_item:
      properties:
        sku: { type: string }
"#;
    let models = build_models(&table(yaml), Flavor::Validation).unwrap();
    let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["CartItemsItem", "CartItemsItem_2", "Cart"]);
    assert_eq!(model(&models, "CartItemsItem").origin, ModelOrigin::Schema);
    assert_eq!(model(&models, "CartItemsItem_2").origin, ModelOrigin::Nested);
}

#[test]
fn test_cycle_through_nested_object_reports_full_chain() {
    let yaml = r#"
components:
  schemas:
    Folder:
      properties:
        meta:
          type: object
          properties:
            parent: { $ref: '#/components/schemas/Folder' }
"#;
    match build_models(&table(yaml), Flavor::Validation).unwrap_err() {
        GenerateError::CyclicSchema { chain } => {
            assert_eq!(chain, ["Folder", "Folder_meta", "Folder"]);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_unusable_property_name_is_invalid_identifier() {
    let yaml = r####"
components:
  schemas:
    Weird:
      properties:
        "###": { type: string }
"####;
    let err = build_models(&table(yaml), Flavor::Validation).unwrap_err();
    assert!(matches!(
        err,
        GenerateError::InvalidIdentifier {
            role: "property",
            ..
        }
    ));
}

#[test]
fn test_colliding_property_names_are_disambiguated() {
    let yaml = r#"
components:
  schemas:
    Line:
      properties:
        orderid: { type: string }
        order-id: { type: string }
        Order_Item_2: { type: string }
        Order-Item#2: { type: string }
"#;
    let models = build_models(&table(yaml), Flavor::Validation).unwrap();
    let line = model(&models, "Line");
    assert_eq!(field_names(line), ["orderid", "orderid_5", "Order_Item_2", "OrderItem2"]);
    assert_eq!(line.fields()[1].raw_name, "order-id");
}

#[test]
fn test_render_validation_model() {
    let models = build_models(&table(SHOP_YAML), Flavor::Validation).unwrap();
    let source = render_model(model(&models, "Order"), &modules_for(&models)).unwrap();

    assert!(source.starts_with("// @generated by modelgen from `Order` (validation flavor)."));
    assert!(source.contains("#![allow(non_camel_case_types, non_snake_case)]"));
    assert!(source.contains("use super::order_status::OrderStatus;"));
    assert!(source.contains("static ORDER_SKU_0_PATTERN: std::sync::LazyLock<regex::Regex>"));
    assert!(source.contains("/// A placed order.\n#[derive("));
    assert!(source.contains(
        "    #[validate(length(max = 32), regex(path = *ORDER_SKU_0_PATTERN))]\n    pub sku: String,"
    ));
    assert!(source.contains("    pub status: OrderStatus,"));
    assert!(source.contains("    pub placed_at: Option<chrono::DateTime<chrono::Utc>>,"));
    assert!(source.contains("    #[serde(rename = \"order-id\")]"));
    assert!(source.contains("    #[validate(range(min = 1))]\n    pub orderid: Option<i64>,"));
    assert!(source.contains("    pub r#type: Option<String>,"));
    assert!(source.contains("impl ValidationModel for Order {}"));
    assert!(source.ends_with("}\n"));
}

#[test]
fn test_render_nested_reference_is_validated() {
    let models = build_models(&table(SHOP_YAML), Flavor::Validation).unwrap();
    let source = render_model(model(&models, "Cart"), &modules_for(&models)).unwrap();
    assert!(source.contains("use super::cart_items_item::CartItemsItem;"));
    assert!(source.contains("use super::customer::Customer;"));
    assert!(source.contains("    #[validate(nested)]\n    pub items: Option<Vec<CartItemsItem>>,"));
}

#[test]
fn test_render_keeps_wire_name_of_reserved_fields() {
    let yaml = r#"
components:
  schemas:
    Link:
      required: [self, type]
      properties:
        self: { type: string }
        type: { type: string }
"#;
    let models = build_models(&table(yaml), Flavor::Validation).unwrap();
    let source = render_model(model(&models, "Link"), &modules_for(&models)).unwrap();
    assert!(source.contains("    #[serde(rename = \"self\")]\n    pub self_: String,"));
    assert!(source.contains("    pub r#type: String,"));
    assert!(!source.contains("rename = \"type\""));

    let models = build_models(&table(yaml), Flavor::Persistence).unwrap();
    let source = render_model(model(&models, "Link"), &modules_for(&models)).unwrap();
    assert!(source.contains("    #[sea_orm(column_name = \"self\")]\n    pub self_: Option<String>,"));
    assert!(!source.contains("column_name = \"type\""));
}

#[test]
fn test_render_drops_rules_the_type_cannot_carry() {
    let yaml = r#"
components:
  schemas:
    Event:
      required: [status, at]
      properties:
        status: { type: string, maxLength: 8, enum: [new, old] }
        at: { type: string, format: date-time, maxLength: 40, pattern: "^2" }
        flag: { type: boolean, minimum: 0 }
        tags: { type: array, items: { type: string }, maxLength: 3 }
        score: { type: number, maximum: 10 }
"#;
    let models = build_models(&table(yaml), Flavor::Validation).unwrap();
    let source = render_model(model(&models, "Event"), &modules_for(&models)).unwrap();
    assert!(source.contains("\n    pub status: EventStatus,"));
    assert!(source.contains("\n    pub at: chrono::DateTime<chrono::Utc>,"));
    assert!(!source.contains("PATTERN"));
    assert!(source.contains("    #[validate(length(max = 3))]\n    pub tags: Option<Vec<String>>,"));
    assert!(source.contains("    #[validate(range(max = 10))]\n    pub score: Option<f64>,"));
    assert_eq!(source.matches("#[validate(").count(), 2);
}

#[test]
fn test_pattern_statics_are_unique_per_field() {
    let yaml = r#"
components:
  schemas:
    Codes:
      properties:
        a: { type: string, pattern: "^a$" }
        A: { type: string, pattern: "^A$" }
"#;
    let models = build_models(&table(yaml), Flavor::Validation).unwrap();
    let source = render_model(model(&models, "Codes"), &modules_for(&models)).unwrap();
    assert!(source.contains("static CODES_A_0_PATTERN:"));
    assert!(source.contains("static CODES_A_1_PATTERN:"));
    assert!(source.contains("regex(path = *CODES_A_1_PATTERN)"));
}

#[test]
fn test_render_validation_enum() {
    let models = build_models(&table(SHOP_YAML), Flavor::Validation).unwrap();
    let source = render_model(model(&models, "OrderStatus"), &modules_for(&models)).unwrap();
    assert!(source.contains("pub enum OrderStatus {"));
    assert!(source.contains("    #[serde(rename = \"pending\")]\n    PENDING,"));
    assert!(source.contains("OrderStatus::CANCELLED => \"cancelled\","));
}

#[test]
fn test_render_persistence_model() {
    let models = build_models(&table(SHOP_YAML), Flavor::Persistence).unwrap();

    let customer = render_model(model(&models, "Customer"), &modules_for(&models)).unwrap();
    assert!(customer.contains("#[sea_orm(table_name = \"customer\")]"));
    assert!(customer.contains("    #[sea_orm(unique, indexed)]\n    pub email: Option<String>,"));
    assert!(customer.contains("    pub name: String,"));
    assert!(customer.contains("    #[sea_orm(default_value = \"basic\")]\n    pub tier: Option<String>,"));
    assert!(customer.contains("    #[sea_orm(primary_key)]\n    pub id: i64,"));
    assert!(customer.contains("impl PersistenceModel for Model {}"));
    assert!(customer.contains("pub type Customer = Model;"));

    let order = render_model(model(&models, "Order"), &modules_for(&models)).unwrap();
    assert!(order.contains("use super::order_status::OrderStatus;"));
    assert!(order.contains("    pub status: Option<OrderStatus>,"));
    assert!(order.contains("    #[sea_orm(column_name = \"order-id\")]\n    pub orderid: Option<i64>,"));

    let cart = render_model(model(&models, "Cart"), &modules_for(&models)).unwrap();
    assert!(cart.contains("    pub items: Option<Json>,"));
    assert!(cart.contains("    pub owner: Option<Json>,"));
}

#[test]
fn test_render_persistence_enum() {
    let models = build_models(&table(SHOP_YAML), Flavor::Persistence).unwrap();
    let source = render_model(model(&models, "OrderStatus"), &modules_for(&models)).unwrap();
    assert!(source.contains("#[sea_orm(rs_type = \"String\", db_type = \"Text\")]"));
    assert!(source.contains("    #[sea_orm(string_value = \"shipped\")]"));
}

#[test]
fn test_plan_artifacts_orders_files_and_index() {
    let models = build_models(&table(SHOP_YAML), Flavor::Validation).unwrap();
    let artifacts = plan_artifacts(&models, Path::new("out"), Flavor::Validation).unwrap();

    let paths: Vec<String> = artifacts
        .iter()
        .map(|a| a.path.display().to_string())
        .collect();
    assert_eq!(
        paths,
        [
            "out/order_status.rs",
            "out/order.rs",
            "out/customer.rs",
            "out/cart_items_item.rs",
            "out/cart.rs",
            "out/mod.rs",
        ]
    );

    let index = &artifacts.last().unwrap().content;
    assert!(index.contains(
        "pub mod base;\npub mod order_status;\npub mod order;\npub mod customer;\npub mod cart_items_item;\npub mod cart;\n"
    ));
}

#[test]
fn test_plan_artifacts_avoids_reserved_stems() {
    let yaml = r#"
components:
  schemas:
    Base:
      properties:
        x: { type: string }
    Holder:
      properties:
        base: { $ref: '#/components/schemas/Base' }
"#;
    let models = build_models(&table(yaml), Flavor::Validation).unwrap();
    let artifacts = plan_artifacts(&models, Path::new("out"), Flavor::Validation).unwrap();
    assert_eq!(artifacts[0].path, Path::new("out/base_0.rs"));
    assert!(artifacts[1].content.contains("use super::base_0::Base;"));
}

#[test]
fn test_plan_artifacts_escapes_reserved_module_names() {
    let yaml = r#"
components:
  schemas:
    self:
      properties:
        x: { type: string }
    type:
      properties:
        y: { type: string }
"#;
    let models = build_models(&table(yaml), Flavor::Validation).unwrap();
    let artifacts = plan_artifacts(&models, Path::new("out"), Flavor::Validation).unwrap();
    assert_eq!(artifacts[0].path, Path::new("out/self_.rs"));
    assert!(artifacts[0].content.contains("pub struct Self_ {"));
    assert_eq!(artifacts[1].path, Path::new("out/type.rs"));

    let index = &artifacts.last().unwrap().content;
    assert!(index.contains("pub mod self_;\npub mod r#type;\n"));
}

#[test]
fn test_default_policy_per_flavor() {
    assert_eq!(default_policy(Flavor::Validation), WritePolicy::SkipIfExists);
    assert_eq!(default_policy(Flavor::Persistence), WritePolicy::BackupThenOverwrite);
}

#[test]
fn test_write_policy_from_str() {
    assert_eq!("skip".parse::<WritePolicy>().unwrap(), WritePolicy::SkipIfExists);
    assert_eq!(
        "backup-then-overwrite".parse::<WritePolicy>().unwrap(),
        WritePolicy::BackupThenOverwrite
    );
    assert!("clobber".parse::<WritePolicy>().is_err());
}
