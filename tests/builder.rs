//! Integration tests for the region builder's public entry points.

use ehscope::{prelude::*, Result};

/// `try { try { f(); } catch { g(); } } finally { h(); }`
fn nested_try() -> Result<(MethodBody, StatementId, StatementId)> {
    let mut b = MethodBodyBuilder::new();
    let f = b.expression(&[]);
    let inner_body = b.block(vec![f]);
    let g = b.expression(&[]);
    let catch_body = b.block(vec![g]);
    let inner = b.try_catch(inner_body, vec![CatchClause::new(catch_body)]);
    let outer_body = b.block(vec![inner]);
    let h = b.expression(&[]);
    let handler = b.block(vec![h]);
    let outer = b.try_finally(outer_body, handler);
    let root = b.block(vec![outer]);
    Ok((b.finish(root)?, inner, outer))
}

#[test]
fn test_clause_table_lists_inner_clauses_first() -> Result<()> {
    let (body, inner, outer) = nested_try()?;
    let tree = RegionBuilder::new().build(&body)?;

    let clauses = tree.exception_clauses();
    assert_eq!(clauses.len(), 2);
    assert!(!clauses[0].is_finally());
    assert!(clauses[1].is_finally());
    assert!(clauses[1].encloses(&clauses[0]));

    let owner = |clause: &ExceptionClause| {
        tree.region(clause.region)
            .and_then(|r| r.parent())
            .and_then(|p| tree.region(p))
            .map(Region::statement)
    };
    assert_eq!(owner(&clauses[0]), Some(inner));
    assert_eq!(
        tree.region(clauses[1].region).map(Region::statement),
        Some(outer)
    );
    Ok(())
}

#[test]
fn test_listing_marks_every_block() -> Result<()> {
    let (body, _, _) = nested_try()?;
    let tree = RegionBuilder::new().build(&body)?;
    let listing = tree.to_string();

    assert_eq!(listing.matches(".try").count(), 4);
    assert_eq!(listing.matches("catch [any]").count(), 1);
    assert_eq!(listing.lines().filter(|l| l.trim() == "finally").count(), 1);
    assert_eq!(listing.matches("endfinally").count(), 1);
    assert_eq!(
        listing.lines().filter(|l| l.contains(": ")).count(),
        tree.instructions().len()
    );
    assert!(listing.trim_end().ends_with("ret"));
    Ok(())
}

#[test]
fn test_malformed_input_is_rejected() -> Result<()> {
    // continue inside a switch without a loop
    let mut b = MethodBodyBuilder::new();
    let cont = b.continue_stmt();
    let section = b.block(vec![cont]);
    let switch = b.switch(vec![section], None);
    let root = b.block(vec![switch]);
    let body = b.finish(root)?;
    assert!(matches!(
        RegionBuilder::new().build(&body),
        Err(Error::MalformedRegion { .. })
    ));

    // goto out of a finally handler
    let mut b = MethodBodyBuilder::new();
    let label = b.label();
    let try_body = b.block(vec![]);
    let jump = b.goto_stmt(label);
    let handler = b.block(vec![jump]);
    let try_stmt = b.try_finally(try_body, handler);
    let f = b.expression(&[]);
    let labeled = b.labeled(label, f);
    let root = b.block(vec![try_stmt, labeled]);
    let body = b.finish(root)?;
    assert!(matches!(
        RegionBuilder::new().build(&body),
        Err(Error::MalformedRegion { .. })
    ));

    // goto into a catch handler
    let mut b = MethodBodyBuilder::new();
    let label = b.label();
    let jump = b.goto_stmt(label);
    let try_body = b.block(vec![jump]);
    let g = b.expression(&[]);
    let labeled = b.labeled(label, g);
    let catch_body = b.block(vec![labeled]);
    let try_stmt = b.try_catch(try_body, vec![CatchClause::new(catch_body)]);
    let root = b.block(vec![try_stmt]);
    let body = b.finish(root)?;
    assert!(matches!(
        RegionBuilder::new().build(&body),
        Err(Error::MalformedRegion { .. })
    ));
    Ok(())
}

#[test]
fn test_goto_to_undefined_label_fails_at_finish() {
    let mut b = MethodBodyBuilder::new();
    let label = b.label();
    let jump = b.goto_stmt(label);
    let root = b.block(vec![jump]);
    assert!(matches!(b.finish(root), Err(Error::UnresolvedLabel(l)) if l == label));
}

#[test]
fn test_lambdas_are_isolated() -> Result<()> {
    // try { Action a = () => { return; }; } finally { }
    let mut b = MethodBodyBuilder::new();
    let ret = b.return_stmt();
    let lambda_body = b.block(vec![ret]);
    let lambda = b.lambda(lambda_body);
    let try_body = b.block(vec![lambda]);
    let handler = b.block(vec![]);
    let try_stmt = b.try_finally(try_body, handler);
    let root = b.block(vec![try_stmt]);
    let body = b.finish(root)?;

    let builder = RegionBuilder::new();
    let tree = builder.build(&body)?;
    let finally = tree
        .regions_of_kind(RegionKind::Finally)
        .next()
        .expect("finally region");
    assert!(finally.exits().is_exitless());
    assert!(tree.instructions().contains(&Instruction::Closure(lambda)));

    let lambdas = builder.build_lambdas(&body)?;
    assert_eq!(lambdas.len(), 1);
    assert_eq!(lambdas[0].len(), 1);
    assert_eq!(lambdas[0].instructions(), &[Instruction::Return]);
    Ok(())
}

#[test]
fn test_batch_matches_sequential_builds() -> Result<()> {
    let mut bodies = Vec::new();
    for depth in 1..=16 {
        // depth nested `using` statements around a return
        let mut b = MethodBodyBuilder::new();
        let mut current = b.return_stmt();
        for _ in 0..depth {
            let block = b.block(vec![current]);
            current = b.using(block);
        }
        let root = b.block(vec![current]);
        bodies.push(b.finish(root)?);
    }

    let builder = RegionBuilder::new();
    let batch = builder.build_batch(&bodies);
    for (depth, (body, built)) in bodies.iter().zip(batch).enumerate() {
        let built = built?;
        let sequential = builder.build(body)?;
        assert_eq!(built.instructions(), sequential.instructions());
        assert_eq!(built.len(), sequential.len());
        assert_eq!(built.regions_of_kind(RegionKind::Finally).count(), depth + 1);
    }
    Ok(())
}

#[test]
fn test_active_regions_at_offset() -> Result<()> {
    let (body, _, _) = nested_try()?;
    let tree = RegionBuilder::new().build(&body)?;

    // f() is the first instruction, inside Finally > Try > group > Try.
    let active = tree.active_at(0);
    assert_eq!(active.len(), 4);
    let innermost = tree.region(active[0]).expect("innermost");
    assert_eq!(innermost.kind(), RegionKind::Try);
    assert_eq!(
        tree.region(*active.last().expect("outermost")).map(Region::kind),
        Some(RegionKind::Finally)
    );
    Ok(())
}
