//! Call stack behavior: protected-call recovery, stack growth, and
//! cooperative suspension.

use tern_core::{
    CallKind, Config, Global, MULTRET, Runtime, ThreadState, ThreadStatus, Value, VmError,
    VmResult, call, check_stack, find_upvalue, pcall, set_continuation, suspend,
};

fn raiser(_g: &mut Global, th: &mut ThreadState) -> VmResult<i32> {
    th.push(Value::Number(99.0)); // garbage the unwind must discard
    Err(VmError::runtime("boom"))
}

#[test]
fn protected_call_restores_thread_state() {
    let mut rt = Runtime::new(Config::default()).unwrap();
    rt.with_main(|g, th| {
        let old_top = th.top();
        let old_depth = th.frame_depth();

        let status = pcall(
            g,
            th,
            |g, th| {
                // grow the stack well past its initial size
                check_stack(&mut g.mem, &mut g.gc, th, 2_000)?;
                for i in 0..100 {
                    th.push(Value::Number(i as f64));
                }
                // leave an upvalue open above the saved top
                let level = th.top() - 1;
                find_upvalue(&mut g.heap.upvalues, &mut g.mem, &mut g.gc, th, level)?;
                // then fail from inside a real call
                let func = th.top();
                th.push(Value::LightFunction(raiser));
                call(g, th, func, 0, false)?;
                Ok(())
            },
            old_top,
            0,
        );

        assert_eq!(status, ThreadStatus::ErrRun);
        // top restored, with the error value as the single new slot
        assert_eq!(th.top(), old_top + 1);
        assert_eq!(g.str_bytes(th.value(old_top)), Some(&b"boom"[..]));
        // frame chain restored
        assert_eq!(th.frame_depth(), old_depth);
        // no open upvalue survived above the saved top
        assert_eq!(th.open_upvalue_count(), 0);
    });
}

#[test]
fn pcall_success_leaves_results_alone() {
    let mut rt = Runtime::new(Config::default()).unwrap();
    rt.with_main(|g, th| {
        let old_top = th.top();
        let status = pcall(
            g,
            th,
            |g, th| {
                check_stack(&mut g.mem, &mut g.gc, th, 2)?;
                th.push(Value::Number(7.0));
                Ok(())
            },
            old_top,
            0,
        );
        assert_eq!(status, ThreadStatus::Ok);
        assert_eq!(th.top(), old_top + 1);
        assert_eq!(th.value(old_top).as_number(), Some(7.0));
    });
}

#[test]
fn saved_indices_survive_relocation() {
    let mut rt = Runtime::new(Config::default()).unwrap();
    rt.with_main(|g, th| {
        check_stack(&mut g.mem, &mut g.gc, th, 3).unwrap();
        th.push(Value::Number(1.0));
        th.push(Value::Boolean(true));
        th.push(Value::Number(3.0));
        let saved: Vec<usize> = (th.top() - 3..th.top()).collect();
        // force at least one relocation
        check_stack(&mut g.mem, &mut g.gc, th, 5_000).unwrap();
        assert_eq!(th.value(saved[0]).as_number(), Some(1.0));
        assert_eq!(th.value(saved[1]).as_boolean(), Some(true));
        assert_eq!(th.value(saved[2]).as_number(), Some(3.0));
    });
}

fn step_one(_g: &mut Global, th: &mut ThreadState) -> VmResult<i32> {
    th.push(Value::Number(1.0));
    set_continuation(th, step_two, 0);
    suspend(th)?;
    Ok(1)
}

fn step_two(_g: &mut Global, th: &mut ThreadState) -> VmResult<i32> {
    th.push(Value::Number(2.0));
    Ok(1)
}

#[test]
fn coroutine_yield_and_resume() {
    let mut rt = Runtime::new(Config::default()).unwrap();
    let co = rt.new_thread().unwrap();

    // seed the coroutine stack with the function to run
    {
        let th = rt.g.heap.threads.get_mut(co);
        th.push(Value::LightFunction(step_one));
    }

    assert_eq!(rt.resume(co, 0), ThreadStatus::Yield);
    assert_eq!(rt.g.heap.threads[co].status, ThreadStatus::Yield);

    assert_eq!(rt.resume(co, 0), ThreadStatus::Ok);
    let th = &rt.g.heap.threads[co];
    assert_eq!(th.value(th.top() - 1).as_number(), Some(2.0));

    // a finished coroutine cannot be resumed again
    assert_eq!(rt.resume(co, 0), ThreadStatus::ErrRun);
    rt.free_thread(co);
}

#[test]
fn resume_of_fresh_coroutine_runs_to_completion() {
    fn forty_two(_g: &mut Global, th: &mut ThreadState) -> VmResult<i32> {
        th.push(Value::Number(42.0));
        Ok(1)
    }
    let mut rt = Runtime::new(Config::default()).unwrap();
    let co = rt.new_thread().unwrap();
    {
        let th = rt.g.heap.threads.get_mut(co);
        th.push(Value::LightFunction(forty_two));
        th.push(Value::Number(0.0)); // an argument, ignored by the callee
    }
    assert_eq!(rt.resume(co, 1), ThreadStatus::Ok);
    let th = &rt.g.heap.threads[co];
    assert_eq!(th.value(th.top() - 1).as_number(), Some(42.0));
    rt.free_thread(co);
}

#[test]
fn error_in_coroutine_surfaces_as_status() {
    let mut rt = Runtime::new(Config::default()).unwrap();
    let co = rt.new_thread().unwrap();
    {
        let th = rt.g.heap.threads.get_mut(co);
        th.push(Value::LightFunction(raiser));
    }
    assert_eq!(rt.resume(co, 0), ThreadStatus::ErrRun);
    let msg = {
        let th = &rt.g.heap.threads[co];
        rt.g.str_bytes(th.value(th.top() - 1)).map(<[u8]>::to_vec)
    };
    assert_eq!(msg.as_deref(), Some(&b"boom"[..]));
    rt.free_thread(co);
}

#[test]
fn native_call_through_closure_upvalues() {
    fn pull_upvalue(g: &mut Global, th: &mut ThreadState) -> VmResult<i32> {
        let frame = *th.current_frame();
        let Value::NativeClosure(id) = *th.value(frame.func) else {
            return Err(VmError::runtime("callee is not a native closure"));
        };
        let tern_core::Closure::Native(c) = &g.heap.closures[id] else {
            unreachable!();
        };
        let v = c.upvalues[0];
        th.push(v);
        Ok(1)
    }
    let mut rt = Runtime::new(Config::default()).unwrap();
    rt.with_main(|g, th| {
        let bound = g.new_string(b"bound").unwrap();
        let c = g.new_native_closure(pull_upvalue, &[bound]).unwrap();
        check_stack(&mut g.mem, &mut g.gc, th, 2).unwrap();
        let func = th.top();
        th.push(Value::NativeClosure(c));
        let kind = call(g, th, func, MULTRET, false).unwrap();
        assert_eq!(kind, CallKind::Native);
        assert_eq!(g.str_bytes(th.value(func)), Some(&b"bound"[..]));
    });
}
