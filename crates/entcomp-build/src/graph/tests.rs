use super::*;
use entcomp_schema::{
    decl::{ComponentDecl, Declarations, EntityDecl},
    load,
};
use proptest::prelude::*;

fn order(decls: &Declarations, entity: &str) -> Result<Vec<String>, ComposeError> {
    let schema = load(decls).unwrap();
    let entity = schema.get_entity(entity).unwrap();

    linearize(&schema, entity).map(Linearization::into_inner)
}

#[test]
fn pulls_in_transitive_requirements_first() {
    let decls = Declarations::new()
        .component(ComponentDecl::new("Shielded"))
        .component(ComponentDecl::new("Armored").requires("Shielded"))
        .component(ComponentDecl::new("Mobile"))
        .entity(EntityDecl::new("Tank", ["Armored", "Mobile"]));

    assert_eq!(
        order(&decls, "Tank").unwrap(),
        ["Shielded", "Armored", "Mobile"]
    );
}

#[test]
fn ties_follow_request_order_then_name() {
    let decls = Declarations::new()
        .component(ComponentDecl::new("Zeta"))
        .component(ComponentDecl::new("Alpha"))
        .component(ComponentDecl::new("Beta"))
        .component(ComponentDecl::new("Gamma").requires("Beta").requires("Alpha"))
        .entity(EntityDecl::new("E", ["Zeta", "Gamma"]));

    // Alpha and Beta inherit Gamma's rank, so they follow Zeta and sort by name
    assert_eq!(order(&decls, "E").unwrap(), ["Zeta", "Alpha", "Beta", "Gamma"]);
}

#[test]
fn shared_requirement_keeps_first_roots_rank() {
    let decls = Declarations::new()
        .component(ComponentDecl::new("Core"))
        .component(ComponentDecl::new("A"))
        .component(ComponentDecl::new("B").requires("Core"))
        .component(ComponentDecl::new("C").requires("Core"))
        .entity(EntityDecl::new("E", ["C", "A", "B"]));

    assert_eq!(order(&decls, "E").unwrap(), ["Core", "C", "A", "B"]);
}

#[test]
fn universal_components_come_first() {
    let decls = Declarations::new()
        .component(ComponentDecl::new("Position").universal())
        .component(ComponentDecl::new("Health").universal())
        .component(ComponentDecl::new("Mobile"))
        .component(ComponentDecl::new("Armored"))
        .entity(EntityDecl::new("Tank", ["Mobile", "Armored"]));

    assert_eq!(
        order(&decls, "Tank").unwrap(),
        ["Health", "Position", "Mobile", "Armored"]
    );
}

#[test]
fn requiring_an_excluded_component_fails() {
    let decls = Declarations::new()
        .component(ComponentDecl::new("Flying").excludes("Grounded"))
        .component(ComponentDecl::new("Grounded"))
        .component(ComponentDecl::new("Wheeled").requires("Grounded"))
        .entity(EntityDecl::new("Car", ["Wheeled", "Flying"]));

    assert_eq!(
        order(&decls, "Car").unwrap_err(),
        ComposeError::ExcludedPair {
            entity: "Car".into(),
            first: "Flying".into(),
            second: "Grounded".into(),
        }
    );
}

#[test]
fn exclusion_declared_on_either_side_applies() {
    let decls = Declarations::new()
        .component(ComponentDecl::new("A"))
        .component(ComponentDecl::new("B").excludes("A"))
        .entity(EntityDecl::new("AB", ["A", "B"]))
        .entity(EntityDecl::new("BA", ["B", "A"]));

    assert!(matches!(
        order(&decls, "AB"),
        Err(ComposeError::ExcludedPair { .. })
    ));
    assert!(matches!(
        order(&decls, "BA"),
        Err(ComposeError::ExcludedPair { .. })
    ));
}

#[test]
fn reports_the_cycle_path() {
    let decls = Declarations::new()
        .component(ComponentDecl::new("A").requires("B"))
        .component(ComponentDecl::new("B").requires("C"))
        .component(ComponentDecl::new("C").requires("A"))
        .component(ComponentDecl::new("D"))
        .entity(EntityDecl::new("E", ["D", "A"]));

    let err = order(&decls, "E").unwrap_err();
    assert_eq!(
        err,
        ComposeError::CyclicDependency {
            entity: "E".into(),
            cycle: vec!["A".into(), "B".into(), "C".into(), "A".into()],
        }
    );
    assert_eq!(err.to_string(), "entity 'E': cyclic requirement A -> B -> C -> A");
}

#[test]
fn universal_requiring_ordinary_component_is_cyclic() {
    let decls = Declarations::new()
        .component(ComponentDecl::new("Base").universal().requires("Extra"))
        .component(ComponentDecl::new("Extra"))
        .entity(EntityDecl::new("E", ["Extra"]));

    assert!(matches!(
        order(&decls, "E"),
        Err(ComposeError::CyclicDependency { .. })
    ));
}

#[test]
fn graph_records_ranks() {
    let decls = Declarations::new()
        .component(ComponentDecl::new("Shielded"))
        .component(ComponentDecl::new("Armored").requires("Shielded"))
        .component(ComponentDecl::new("Mobile"))
        .entity(EntityDecl::new("Tank", ["Armored", "Mobile"]));
    let schema = load(&decls).unwrap();
    let tank = schema.get_entity("Tank").unwrap();

    let graph = CompositionGraph::build(&schema, tank).unwrap();
    assert_eq!(graph.len(), 3);
    assert_eq!(graph.node("Shielded").unwrap().rank, 1);
    assert_eq!(graph.node("Mobile").unwrap().rank, 2);
    assert_eq!(graph.node("Armored").unwrap().requires, ["Shielded"]);
}

proptest! {
    #[test]
    fn linearization_is_deterministic_and_respects_requirements(
        edges in prop::collection::vec((0usize..8, 0usize..8), 0..16),
        request in prop::sample::subsequence((0usize..8).collect::<Vec<_>>(), 1..8),
    ) {
        // only allow edges from higher to lower index so the graph is acyclic
        let mut components: Vec<ComponentDecl> =
            (0..8).map(|i| ComponentDecl::new(format!("C{i}"))).collect();
        for (a, b) in edges {
            if a > b {
                components[a].requires.push(format!("C{b}"));
            }
        }

        let mut decls = Declarations::new();
        for component in components {
            decls = decls.component(component);
        }
        let decls = decls.entity(EntityDecl::new("E", request.iter().map(|i| format!("C{i}"))));

        let first = order(&decls, "E").unwrap();
        let second = order(&decls, "E").unwrap();
        prop_assert_eq!(&first, &second);

        let schema = load(&decls).unwrap();
        for (pos, name) in first.iter().enumerate() {
            for req in &schema.get_component(name).unwrap().requires {
                let req_pos = first.iter().position(|n| n == req).unwrap();
                prop_assert!(req_pos < pos, "{req} must precede {name}");
            }
        }
    }
}
