//! Well-formed method bodies covering the shapes the region builder distinguishes.

use crate::body::{
    CatchClause, Condition, ExceptionType, FilterExpression, MethodBody, MethodBodyBuilder,
    StatementId,
};

/// Ids of the interesting statements of a factory body.
#[derive(Debug, Clone, Copy)]
pub struct TryIds {
    /// The `try` (or synthetic) statement.
    pub stmt: StatementId,
    /// Its protected body.
    pub body: StatementId,
    /// Its finally handler, or the first catch handler when there is none.
    pub handler: StatementId,
    /// An enclosing loop, the labeled statement or a jump, depending on the factory.
    pub other: StatementId,
}

/// `try { } finally { }`
pub fn empty_try_finally() -> (MethodBody, TryIds) {
    let mut b = MethodBodyBuilder::new();
    let body = b.block(vec![]);
    let handler = b.block(vec![]);
    let stmt = b.try_finally(body, handler);
    let root = b.block(vec![stmt]);
    let ids = TryIds {
        stmt,
        body,
        handler,
        other: root,
    };
    (b.finish(root).unwrap(), ids)
}

/// `try { f(); } catch (E1) { g(); } finally { h(); }`
pub fn try_catch_finally() -> (MethodBody, TryIds) {
    let mut b = MethodBodyBuilder::new();
    let x = b.expression(&[]);
    let body = b.block(vec![x]);
    let y = b.expression(&[]);
    let catch_body = b.block(vec![y]);
    let z = b.expression(&[]);
    let handler = b.block(vec![z]);
    let stmt = b.try_catch_finally(
        body,
        vec![CatchClause::new(catch_body).with_type(ExceptionType::new("E1"))],
        handler,
    );
    let root = b.block(vec![stmt]);
    let ids = TryIds {
        stmt,
        body,
        handler,
        other: catch_body,
    };
    (b.finish(root).unwrap(), ids)
}

/// `try { f(); } catch (A) { } catch (B) { } catch { }`
pub fn try_three_catches() -> (MethodBody, Vec<StatementId>) {
    let mut b = MethodBodyBuilder::new();
    let x = b.expression(&[]);
    let body = b.block(vec![x]);
    let a = b.block(vec![]);
    let bb = b.block(vec![]);
    let any = b.block(vec![]);
    let stmt = b.try_catch(
        body,
        vec![
            CatchClause::new(a).with_type(ExceptionType::new("A")),
            CatchClause::new(bb).with_type(ExceptionType::new("B")),
            CatchClause::new(any),
        ],
    );
    let root = b.block(vec![stmt]);
    (b.finish(root).unwrap(), vec![a, bb, any])
}

/// `try { f(); } catch (E e) when (e.Flag) { g(e); }`
pub fn filtered_catch() -> (MethodBody, TryIds) {
    let mut b = MethodBodyBuilder::new();
    let e = b.local();
    let x = b.expression(&[]);
    let body = b.block(vec![x]);
    let y = b.expression(&[e]);
    let catch_body = b.block(vec![y]);
    let stmt = b.try_catch(
        body,
        vec![CatchClause::new(catch_body)
            .with_type(ExceptionType::new("E"))
            .with_local(e)
            .with_filter(FilterExpression::new(vec![e]))],
    );
    let root = b.block(vec![stmt]);
    let ids = TryIds {
        stmt,
        body,
        handler: catch_body,
        other: y,
    };
    (b.finish(root).unwrap(), ids)
}

/// `while (true) { try { break; } finally { } }`
pub fn break_in_try_finally() -> (MethodBody, TryIds) {
    let mut b = MethodBodyBuilder::new();
    let brk = b.break_stmt();
    let body = b.block(vec![brk]);
    let handler = b.block(vec![]);
    let stmt = b.try_finally(body, handler);
    let loop_body = b.block(vec![stmt]);
    let looped = b.loop_stmt(Condition::Always, loop_body);
    let root = b.block(vec![looped]);
    let ids = TryIds {
        stmt,
        body,
        handler,
        other: looped,
    };
    (b.finish(root).unwrap(), ids)
}

/// `fixed (p) { for (;;) { } }`
pub fn fixed_with_infinite_loop() -> (MethodBody, TryIds) {
    let mut b = MethodBodyBuilder::new();
    let spin_body = b.block(vec![]);
    let spin = b.loop_stmt(Condition::Always, spin_body);
    let body = b.block(vec![spin]);
    let stmt = b.fixed(body);
    let root = b.block(vec![stmt]);
    let ids = TryIds {
        stmt,
        body,
        handler: spin,
        other: spin,
    };
    (b.finish(root).unwrap(), ids)
}

/// `fixed (p) { goto L; } L: ;`
pub fn fixed_with_goto() -> (MethodBody, TryIds) {
    let mut b = MethodBodyBuilder::new();
    let label = b.label();
    let jump = b.goto_stmt(label);
    let body = b.block(vec![jump]);
    let stmt = b.fixed(body);
    let empty = b.block(vec![]);
    let labeled = b.labeled(label, empty);
    let root = b.block(vec![stmt, labeled]);
    let ids = TryIds {
        stmt,
        body,
        handler: jump,
        other: labeled,
    };
    (b.finish(root).unwrap(), ids)
}

/// `fixed (p) { return; }`
pub fn fixed_with_return() -> (MethodBody, TryIds) {
    let mut b = MethodBodyBuilder::new();
    let ret = b.return_stmt();
    let body = b.block(vec![ret]);
    let stmt = b.fixed(body);
    let root = b.block(vec![stmt]);
    let ids = TryIds {
        stmt,
        body,
        handler: ret,
        other: ret,
    };
    (b.finish(root).unwrap(), ids)
}

/// `using (r) { f(); }`
pub fn plain_using() -> (MethodBody, TryIds) {
    let mut b = MethodBodyBuilder::new();
    let x = b.expression(&[]);
    let body = b.block(vec![x]);
    let stmt = b.using(body);
    let root = b.block(vec![stmt]);
    let ids = TryIds {
        stmt,
        body,
        handler: x,
        other: x,
    };
    (b.finish(root).unwrap(), ids)
}

/// `try { goto L; } finally { for (;;) { } } L: f();`
pub fn goto_past_divergent_finally() -> (MethodBody, TryIds) {
    let mut b = MethodBodyBuilder::new();
    let label = b.label();
    let jump = b.goto_stmt(label);
    let body = b.block(vec![jump]);
    let spin_body = b.block(vec![]);
    let spin = b.loop_stmt(Condition::Always, spin_body);
    let handler = b.block(vec![spin]);
    let stmt = b.try_finally(body, handler);
    let f = b.expression(&[]);
    let labeled = b.labeled(label, f);
    let root = b.block(vec![stmt, labeled]);
    let ids = TryIds {
        stmt,
        body,
        handler,
        other: f,
    };
    (b.finish(root).unwrap(), ids)
}

/// `using (a) { lock (o) { return; } }`, nested synthetic statements sharing one exit.
pub fn nested_synthetic_return() -> (MethodBody, TryIds) {
    let mut b = MethodBodyBuilder::new();
    let ret = b.return_stmt();
    let inner_body = b.block(vec![ret]);
    let inner = b.lock(inner_body);
    let body = b.block(vec![inner]);
    let stmt = b.using(body);
    let root = b.block(vec![stmt]);
    let ids = TryIds {
        stmt,
        body,
        handler: inner,
        other: inner_body,
    };
    (b.finish(root).unwrap(), ids)
}
