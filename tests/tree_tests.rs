use njtree::model::{BranchLength, PhyloTree, TaxonLabelMap};

/// Rooted binary tree over three taxa:
/// ((cat:1.0, dog:1.0):1.5, rat:0.5)
fn three_taxon_tree() -> (PhyloTree, [usize; 5]) {
    let mut tree = PhyloTree::new(3);
    let index_l1 = tree.add_leaf(0);
    let index_l2 = tree.add_leaf(1);
    let index_l3 = tree.add_leaf(2);
    tree.set_branch_length(index_l1, BranchLength::new(1.0));
    tree.set_branch_length(index_l2, BranchLength::new(1.0));
    tree.set_branch_length(index_l3, BranchLength::new(0.5));
    let index_i1 = tree.add_internal([index_l1, index_l2], Some(BranchLength::new(1.5)));
    let index_root = tree.add_root(vec![index_i1, index_l3]);
    (tree, [index_l1, index_l2, index_l3, index_i1, index_root])
}

#[test]
fn test_building_tree() {
    let (tree, [index_l1, index_l2, index_l3, index_i1, index_root]) = three_taxon_tree();

    // Counts
    assert_eq!(tree.num_leaves(), 3);
    assert_eq!(tree.num_internal(), 1);
    assert_eq!(tree.num_vertices(), 5);

    // Root
    let root = tree.root();
    assert_eq!(root.index(), index_root);
    assert!(root.is_root());
    assert_eq!(root.children(), &[index_i1, index_l3]);

    // Leaf
    let l2 = &tree[index_l2];
    assert!(l2.is_leaf());
    assert_eq!(l2.index(), index_l2);
    assert_eq!(l2.label_index().unwrap(), 1);
    assert_eq!(l2.parent(), Some(index_i1));

    // Internal
    let inti = &tree[index_i1];
    assert!(inti.is_internal());
    assert_eq!(inti.index(), index_i1);
    assert_eq!(inti.branch_length().unwrap(), BranchLength::new(1.5));

    let _ = index_l1;
}

#[test]
fn test_tree_is_valid_and_measured() {
    let (tree, _) = three_taxon_tree();
    assert!(tree.is_valid());
    assert!(tree.vertices_have_branch_lengths());
    assert!((tree.total_branch_length() - 4.0).abs() < 1e-12);
}

#[test]
fn test_trifurcating_root_is_valid() {
    let mut tree = PhyloTree::new(3);
    let index_l1 = tree.add_leaf(0);
    let index_l2 = tree.add_leaf(1);
    let index_l3 = tree.add_leaf(2);
    for index in [index_l1, index_l2, index_l3] {
        tree.set_branch_length(index, BranchLength::new(0.5));
    }
    let index_root = tree.add_root(vec![index_l1, index_l2, index_l3]);

    assert!(tree.is_valid());
    assert_eq!(tree.num_vertices(), 4);
    assert_eq!(tree.root().index(), index_root);
    assert_eq!(tree.root().children().len(), 3);
}

#[test]
fn test_iteration_orders() {
    let (tree, [index_l1, index_l2, index_l3, index_i1, index_root]) = three_taxon_tree();

    let pre_order: Vec<usize> = tree.pre_order_iter().map(|v| v.index()).collect();
    assert_eq!(pre_order, vec![index_root, index_i1, index_l1, index_l2, index_l3]);

    let post_order: Vec<usize> = tree.post_order_iter().map(|v| v.index()).collect();
    assert_eq!(post_order, vec![index_l1, index_l2, index_i1, index_l3, index_root]);
}

#[test]
fn test_patristic_distances() {
    let (tree, _) = three_taxon_tree();
    let distances = tree.patristic_distances();

    assert_eq!(distances.len(), 3);
    assert!((distances[0][0]).abs() < 1e-12);
    // cat -> dog through the shared internal vertex
    assert!((distances[0][1] - 2.0).abs() < 1e-12);
    // cat -> rat through the root
    assert!((distances[0][2] - 3.0).abs() < 1e-12);
    assert!((distances[1][2] - 3.0).abs() < 1e-12);
    assert_eq!(distances[0][1], distances[1][0]);
}

#[test]
fn test_ultrametric_check() {
    // Leaves at depth 2.0 on both sides of the root
    let mut balanced = PhyloTree::new(3);
    let index_l1 = balanced.add_leaf(0);
    let index_l2 = balanced.add_leaf(1);
    let index_l3 = balanced.add_leaf(2);
    balanced.set_branch_length(index_l1, BranchLength::new(1.0));
    balanced.set_branch_length(index_l2, BranchLength::new(1.0));
    balanced.set_branch_length(index_l3, BranchLength::new(2.0));
    let index_i1 = balanced.add_internal([index_l1, index_l2], Some(BranchLength::new(1.0)));
    balanced.add_root(vec![index_i1, index_l3]);
    assert!(balanced.is_ultrametric());

    let (skewed, _) = three_taxon_tree();
    assert!(!skewed.is_ultrametric());
}

#[test]
#[should_panic]
fn test_get_root_panics_on_empty_tree() {
    let tree = PhyloTree::new(2);
    tree.root(); // Should panic
}

#[test]
#[should_panic]
fn test_get_vertex_out_of_bounds() {
    let tree = PhyloTree::new(2);
    let _ = &tree[55];
}

// ============= TaxonLabelMap Tests =============

#[test]
fn test_from_labels_preserves_order() {
    let map = TaxonLabelMap::from_labels(&[
        "Anarhynchus frontalis",
        "Himantopus novaezelandiae",
        "Himantopus leucocephalus",
    ])
    .unwrap();

    assert_eq!(map.num_labels(), 3);
    assert_eq!(map.get_label(0), Some("Anarhynchus frontalis"));
    assert_eq!(map.index_of("Himantopus leucocephalus"), Some(2));
    assert!(map.contains_label("Himantopus novaezelandiae"));
}

#[test]
fn test_from_labels_rejects_duplicates() {
    let result = TaxonLabelMap::from_labels(&[
        "Strigops habroptilus",
        "Nestor notabilis",
        "Strigops habroptilus",
    ]);
    assert_eq!(result.unwrap_err(), "Strigops habroptilus");
}

#[test]
fn test_get_label_returns_none_for_invalid_index() {
    let map = TaxonLabelMap::from_labels(&["Nestor meridionalis"]).unwrap();
    assert_eq!(map.get_label(5), None);
}
