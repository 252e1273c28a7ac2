//! Factory for bodies that pass arena validation but cannot form a valid region tree.

use crate::{
    body::{CatchClause, MethodBodyBuilder},
    test::TestBody,
};

/// Test factory for the structural checks of the region builder.
///
/// Creates bodies covering each rejection rule:
/// 1. Clean body (should pass)
/// 2. `break` outside any loop or switch
/// 3. `goto` into a protected body from outside
/// 4. `return` out of a `finally` handler
/// 5. `throw;` outside a catch handler
/// 6. Exception local read after its catch handler
/// 7. Exception local read by another clause's filter
pub fn malformed_body_factory() -> Vec<TestBody> {
    let mut bodies = Vec::new();

    // 1. REQUIRED: Clean body
    {
        let mut b = MethodBodyBuilder::new();
        let x = b.expression(&[]);
        let body = b.block(vec![x]);
        let handler = b.block(vec![]);
        let stmt = b.try_finally(body, handler);
        let root = b.block(vec![stmt]);
        bodies.push(TestBody::new("clean", b.finish(root).unwrap(), true));
    }

    // 2. NEGATIVE: Stray break
    {
        let mut b = MethodBodyBuilder::new();
        let brk = b.break_stmt();
        let root = b.block(vec![brk]);
        bodies.push(TestBody::new("stray break", b.finish(root).unwrap(), false));
    }

    // 3. NEGATIVE: Jump into a try body
    {
        let mut b = MethodBodyBuilder::new();
        let label = b.label();
        let jump = b.goto_stmt(label);
        let x = b.expression(&[]);
        let labeled = b.labeled(label, x);
        let body = b.block(vec![labeled]);
        let handler = b.block(vec![]);
        let stmt = b.try_finally(body, handler);
        let root = b.block(vec![jump, stmt]);
        bodies.push(TestBody::new("goto into try", b.finish(root).unwrap(), false));
    }

    // 4. NEGATIVE: Return out of a finally
    {
        let mut b = MethodBodyBuilder::new();
        let body = b.block(vec![]);
        let ret = b.return_stmt();
        let handler = b.block(vec![ret]);
        let stmt = b.try_finally(body, handler);
        let root = b.block(vec![stmt]);
        bodies.push(TestBody::new(
            "return from finally",
            b.finish(root).unwrap(),
            false,
        ));
    }

    // 5. NEGATIVE: Rethrow outside a catch
    {
        let mut b = MethodBodyBuilder::new();
        let rethrow = b.rethrow_stmt();
        let root = b.block(vec![rethrow]);
        bodies.push(TestBody::new("stray rethrow", b.finish(root).unwrap(), false));
    }

    // 6. NEGATIVE: Exception local outlives its handler
    {
        let mut b = MethodBodyBuilder::new();
        let e = b.local();
        let body = b.block(vec![]);
        let catch_body = b.block(vec![]);
        let stmt = b.try_catch(body, vec![CatchClause::new(catch_body).with_local(e)]);
        let after = b.expression(&[e]);
        let root = b.block(vec![stmt, after]);
        bodies.push(TestBody::new(
            "exception local after handler",
            b.finish(root).unwrap(),
            false,
        ));
    }

    // 7. NEGATIVE: Exception local read by a sibling clause's filter
    {
        let mut b = MethodBodyBuilder::new();
        let e = b.local();
        let body = b.block(vec![]);
        let first = b.block(vec![]);
        let second = b.block(vec![]);
        let stmt = b.try_catch(
            body,
            vec![
                CatchClause::new(first).with_local(e),
                CatchClause::new(second)
                    .with_filter(crate::body::FilterExpression::new(vec![e])),
            ],
        );
        let root = b.block(vec![stmt]);
        bodies.push(TestBody::new(
            "exception local in sibling filter",
            b.finish(root).unwrap(),
            false,
        ));
    }

    bodies
}
