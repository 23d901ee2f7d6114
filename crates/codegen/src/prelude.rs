//! Runtime helpers emitted once at the top of every generated module.
//!
//! They carry the evaluation rules the translated expressions rely on:
//! strict equality, null-safe ordering, checked 64-bit integer arithmetic
//! and the concatenation text forms.

pub const PRELUDE: &str = r#"_RB_INT_MIN = -(2 ** 63)
_RB_INT_MAX = 2 ** 63 - 1


def _rb_text(v):
    if v is None:
        return ''
    if v is True:
        return 'TRUE'
    if v is False:
        return 'FALSE'
    return str(v)


def _rb_concat(*parts):
    return ''.join(_rb_text(p) for p in parts)


def _rb_eq(a, b):
    return type(a) is type(b) and a == b


def _rb_ne(a, b):
    return not _rb_eq(a, b)


def _rb_cmp(op, a, b):
    if a is None or b is None:
        return None
    if type(a) is not type(b) or type(a) not in (bool, int, str):
        raise TypeError('type mismatch in %s: expected %s, got %s'
                        % (op, type(a).__name__, type(b).__name__))
    return (a > b) - (a < b)


def _rb_lt(a, b):
    c = _rb_cmp('<', a, b)
    return c is not None and c < 0


def _rb_le(a, b):
    c = _rb_cmp('<=', a, b)
    return c is not None and c <= 0


def _rb_gt(a, b):
    c = _rb_cmp('>', a, b)
    return c is not None and c > 0


def _rb_ge(a, b):
    c = _rb_cmp('>=', a, b)
    return c is not None and c >= 0


def _rb_num(op, v):
    if v is None:
        return 0
    if type(v) is not int:
        raise TypeError('type mismatch in %s: expected Int, got %s' % (op, type(v).__name__))
    return v


def _rb_checked(op, n):
    if n < _RB_INT_MIN or n > _RB_INT_MAX:
        raise OverflowError('integer overflow in %s' % op)
    return n


def _rb_add(a, b):
    return _rb_checked('+', _rb_num('+', a) + _rb_num('+', b))


def _rb_sub(a, b):
    return _rb_checked('-', _rb_num('-', a) - _rb_num('-', b))


def _rb_mul(a, b):
    return _rb_checked('*', _rb_num('*', a) * _rb_num('*', b))


def _rb_div(a, b):
    a = _rb_num('/', a)
    b = _rb_num('/', b)
    if b == 0:
        b = 1
    q = abs(a) // abs(b)
    if (a < 0) != (b < 0):
        q = -q
    return _rb_checked('/', q)


def _rb_neg(a):
    return _rb_checked('-', -_rb_num('-', a))


def _rb_len(s):
    return len(_rb_text(s))


def _rb_lower(s):
    return _rb_text(s).lower()


def _rb_upper(s):
    return _rb_text(s).upper()


def _rb_trim(s):
    return _rb_text(s).strip(' ')


def _rb_find(needle, haystack):
    if needle is None or haystack is None:
        return 0
    return _rb_text(haystack).find(_rb_text(needle)) + 1


def _rb_guard(fn, *args):
    try:
        return fn(*args)
    except (TypeError, OverflowError):
        return None
"#;

/// Every helper name the prelude defines.
pub fn helper_names() -> impl Iterator<Item = &'static str> {
    PRELUDE.lines().filter_map(|line| {
        line.strip_prefix("def ")
            .and_then(|rest| rest.split('(').next())
    })
}
