use as3ts_parser::parse;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

// A medium-size ActionScript class with the usual constructs
const ACTIONSCRIPT_SOURCE: &str = r#"
package com.example.inventory
{
    import flash.events.Event;
    import flash.events.EventDispatcher;
    import flash.utils.Dictionary;

    [Event(name="change", type="flash.events.Event")]
    public class Inventory extends EventDispatcher
    {
        public static const MAX_SLOTS:int = 64;

        private var _items:Vector.<Item> = new Vector.<Item>();
        private var _byId:Dictionary = new Dictionary();
        private var _weight:Number = 0;

        public function Inventory(initial:Array = null)
        {
            super();
            if (initial != null) {
                for each (var item:Item in initial) {
                    add(item);
                }
            }
        }

        public function get weight():Number
        {
            return _weight;
        }

        public function add(item:Item):Boolean
        {
            if (_items.length >= MAX_SLOTS || item == null) {
                return false;
            }
            _items.push(item);
            _byId[item.id] = item;
            _weight += item.weight * item.count;
            dispatchEvent(new Event(Event.CHANGE));
            return true;
        }

        public function remove(id:String):Item
        {
            var item:Item = _byId[id] as Item;
            if (!item) {
                return null;
            }
            delete _byId[id];
            var index:int = _items.indexOf(item);
            if (index >= 0) {
                _items.splice(index, 1);
            }
            _weight -= item.weight * item.count;
            return item;
        }

        public function find(pattern:String):Vector.<Item>
        {
            var re:RegExp = new RegExp(pattern, "i");
            var result:Vector.<Item> = new <Item>[];
            for (var key:String in _byId) {
                var candidate:Item = Item(_byId[key]);
                if (re.test(candidate.name) && candidate is Item) {
                    result.push(candidate);
                }
            }
            return result;
        }

        public function toXML():XML
        {
            var root:XML = <inventory slots={MAX_SLOTS}/>;
            for (var i:int = 0; i < _items.length; i++) {
                root.appendChild(<item id={_items[i].id}>{_items[i].name}</item>);
            }
            return root;
        }
    }
}
"#;

fn bench_parse_actionscript(c: &mut Criterion) {
    c.bench_function("parse_actionscript_medium", |b| {
        b.iter(|| {
            let unit = parse("bench.as", black_box(ACTIONSCRIPT_SOURCE)).expect("bench source parses");
            black_box(unit);
        });
    });
}

criterion_group!(benches, bench_parse_actionscript);
criterion_main!(benches);
